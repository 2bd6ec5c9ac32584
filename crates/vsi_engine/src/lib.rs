//! Uploader engine: HTTP transport and effect execution.
mod client;
mod engine;
mod retry;
mod types;
mod wire;

pub use client::{ClientSettings, ProgressSink, ReqwestTransport, Transport};
pub use engine::{EngineEvent, EngineHandle, EngineSettings};
pub use retry::{with_retry, RetryPolicy};
pub use types::{
    transfer_percent, ErrorKind, HistoryPage, SubmitReceipt, TransportError, UploadRequest,
    TRANSFER_PROGRESS_CAP,
};
