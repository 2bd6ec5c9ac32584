//! Uploader core: pure session and history state machines plus view-model helpers.
mod config;
mod effect;
mod history;
pub mod messages;
mod model;
mod msg;
mod state;
mod update;
mod validation;
mod view_model;

pub use config::{ApiConfig, HistoryConfig, PollConfig, UploadLimits, UploaderConfig, MIB};
pub use effect::Effect;
pub use history::{update_history, HistoryEffect, HistoryMsg, HistoryState, HistoryViewModel};
pub use model::{
    sort_newest_first, Generation, HistoryQuery, JobId, JobStatus, SelectedFile,
    UnknownStatus, UploadJob,
};
pub use msg::Msg;
pub use state::{AppState, Notification, NotificationKind, Phase, UploadStage};
pub use update::update;
pub use validation::{validate_file, ValidationError};
pub use view_model::{AppViewModel, CosmeticProgress};
