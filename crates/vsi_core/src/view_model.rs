use crate::{JobId, JobStatus, Phase};

/// Presentation-only progress synthesized while the server processes the file.
///
/// It is random jitter in the 95..=99 band so the bar does not look frozen. It carries no
/// information about how much work remains and must never be fed back into any decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosmeticProgress(pub f64);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub filename: Option<String>,
    pub file_size: Option<u64>,
    /// Measured share of bytes sent, capped at 95.
    pub transfer_progress: f64,
    pub cosmetic: Option<CosmeticProgress>,
    /// Combined value for the progress bar.
    pub progress: f64,
    /// The server reported `Processing` for the polled job.
    pub processing: bool,
    pub job_id: Option<JobId>,
    pub remote_status: Option<JobStatus>,
    pub error: Option<String>,
    pub can_start: bool,
    pub can_retry: bool,
    pub can_cancel: bool,
    pub dirty: bool,
}
