use crate::{Generation, JobId, SelectedFile};

/// Side effects requested by the session state machine; executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the file as one multipart body, tagged with the session generation.
    SubmitUpload {
        generation: Generation,
        file: SelectedFile,
    },
    /// Begin the fixed-interval status poll for a freshly accepted job.
    StartPolling {
        generation: Generation,
        job_id: JobId,
    },
    /// Abort any in-flight call and tear down the poll loop of that generation.
    StopSession { generation: Generation },
}
