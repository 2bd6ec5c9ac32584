use std::fmt;
use std::path::PathBuf;

use vsi_core::{messages, JobId, SelectedFile, UploadJob};

/// Bytes-sent percentage never goes past this; the rest stands for server-side acceptance.
pub const TRANSFER_PROGRESS_CAP: f64 = 95.0;

/// Percentage of `sent` over `total`, capped. `None` when the size is unknown or zero.
pub fn transfer_percent(sent: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let percent = (sent as f64 / total as f64) * 100.0;
    Some(percent.min(TRANSFER_PROGRESS_CAP))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub filename: String,
    pub media_type: String,
}

impl From<&SelectedFile> for UploadRequest {
    fn from(file: &SelectedFile) -> Self {
        Self {
            path: file.path.clone(),
            filename: file.name.clone(),
            media_type: file.media_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub message: Option<String>,
}

/// One page of past jobs, already sorted newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub jobs: Vec<UploadJob>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Maps an HTTP error response. `body` may carry a JSON `detail` field.
    pub(crate) fn from_status(code: u16, body: &[u8]) -> Self {
        let detail = crate::wire::error_detail(body);
        let kind = match code {
            400 => ErrorKind::BadRequest { detail },
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            408 | 504 => ErrorKind::GatewayTimeout,
            413 => ErrorKind::PayloadTooLarge,
            500 | 502 | 503 => ErrorKind::ServerError(code),
            _ => ErrorKind::HttpStatus { code, detail },
        };
        Self::new(kind, format!("http status {code}"))
    }

    /// Only failures where no response arrived at all are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        let fixed = match &self.kind {
            ErrorKind::Network => messages::NETWORK_ERROR,
            ErrorKind::Timeout | ErrorKind::GatewayTimeout => messages::TIMEOUT_ERROR,
            ErrorKind::UploadTimeout => messages::UPLOAD_TIMEOUT,
            ErrorKind::BadRequest { detail } => {
                return detail
                    .clone()
                    .unwrap_or_else(|| messages::INVALID_REQUEST.to_string())
            }
            ErrorKind::Unauthorized => messages::UNAUTHORIZED,
            ErrorKind::Forbidden => messages::FORBIDDEN,
            ErrorKind::NotFound => messages::NOT_FOUND,
            ErrorKind::PayloadTooLarge => messages::FILE_TOO_LARGE,
            ErrorKind::ServerError(_) => messages::SERVER_ERROR,
            ErrorKind::HttpStatus { detail, .. } => {
                return detail
                    .clone()
                    .unwrap_or_else(|| messages::UPLOAD_FAILED.to_string())
            }
            ErrorKind::InvalidUrl => messages::INVALID_REQUEST,
            ErrorKind::Decode | ErrorKind::File => messages::UPLOAD_FAILED,
        };
        fixed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received: DNS, connect or reset.
    Network,
    /// Our own deadline elapsed on a non-upload request.
    Timeout,
    /// Our own deadline elapsed while sending the file.
    UploadTimeout,
    BadRequest { detail: Option<String> },
    Unauthorized,
    Forbidden,
    NotFound,
    /// 408 or 504 reported by the server or a gateway.
    GatewayTimeout,
    PayloadTooLarge,
    ServerError(u16),
    HttpStatus { code: u16, detail: Option<String> },
    InvalidUrl,
    Decode,
    /// The local file could not be read.
    File,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::UploadTimeout => write!(f, "upload timeout"),
            ErrorKind::BadRequest { .. } => write!(f, "bad request"),
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::Forbidden => write!(f, "forbidden"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::GatewayTimeout => write!(f, "gateway timeout"),
            ErrorKind::PayloadTooLarge => write!(f, "payload too large"),
            ErrorKind::ServerError(code) => write!(f, "server error {code}"),
            ErrorKind::HttpStatus { code, .. } => write!(f, "http status {code}"),
            ErrorKind::InvalidUrl => write!(f, "invalid url"),
            ErrorKind::Decode => write!(f, "invalid response body"),
            ErrorKind::File => write!(f, "file error"),
        }
    }
}
