use thiserror::Error;

use crate::{messages, UploadLimits};

/// Client-side rejection of a candidate file. Advisory only: the server may still refuse
/// files that pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", messages::INVALID_FILE_TYPE)]
    InvalidType,
    #[error("{}", messages::FILE_TOO_LARGE)]
    TooLarge,
}

/// Checks declared media type first, then size. A file exactly at the limit is accepted.
pub fn validate_file(
    media_type: &str,
    size: u64,
    limits: &UploadLimits,
) -> Result<(), ValidationError> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim();
    let allowed = limits
        .allowed_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence));
    if !allowed {
        return Err(ValidationError::InvalidType);
    }
    if size > limits.max_file_size {
        return Err(ValidationError::TooLarge);
    }
    Ok(())
}
