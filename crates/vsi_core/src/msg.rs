use crate::{Generation, JobId, SelectedFile, UploadJob};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked (or dropped) a file.
    FileSelected(SelectedFile),
    /// User clicked Start Upload.
    StartClicked,
    /// User clicked Retry Upload after an error.
    RetryClicked,
    /// User discarded the current file and session.
    CancelClicked,
    /// The hosting view is going away.
    Shutdown,
    /// Bytes went out on the wire; `percent` is already capped by the transport.
    TransferProgress { generation: Generation, percent: f64 },
    /// The upload request finished, successfully or not.
    UploadSubmitted {
        generation: Generation,
        result: Result<JobId, String>,
    },
    /// One status poll finished. `jitter` is a uniform sample in `[0, 1)`.
    StatusPolled {
        generation: Generation,
        job_id: JobId,
        result: Result<UploadJob, String>,
        jitter: f64,
    },
    /// Carries nothing; `update` returns the state unchanged with no effects.
    NoOp,
}
