//! User-facing message catalogue.

// Transport
pub const NETWORK_ERROR: &str = "Network error. Please check your internet connection.";
pub const SERVER_ERROR: &str = "Server error occurred. Please try again later.";
pub const TIMEOUT_ERROR: &str = "Request timed out. Please try again.";
pub const NOT_FOUND: &str = "API endpoint not found. Please check your server connection.";
pub const UNAUTHORIZED: &str = "Unauthorized. Please log in and try again.";
pub const FORBIDDEN: &str = "Access denied. You don't have permission to perform this action.";

// Upload
pub const FILE_TOO_LARGE: &str = "File is too large. Maximum size is 500MB.";
pub const INVALID_FILE_TYPE: &str = "Invalid file type. Only ZIP files are allowed.";
pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";
pub const UPLOAD_TIMEOUT: &str = "Upload timed out. Please try again.";

// Validation
pub const INVALID_REQUEST: &str = "Invalid request. Please check your input.";
pub const MISSING_FILE: &str = "No file selected. Please select a file to upload.";

// History
pub const HISTORY_LOAD_ERROR: &str = "Failed to load upload history. Please try again later.";
pub const STATUS_UPDATE_ERROR: &str = "Failed to update status. Please refresh the page.";

// Session notifications
pub const UPLOAD_ACCEPTED: &str = "File uploaded successfully, processing...";
pub const PROCESSING_COMPLETE: &str = "File processed successfully";
