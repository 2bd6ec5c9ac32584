use std::time::Duration;

pub const MIB: u64 = 1024 * 1024;

/// Compiled-in defaults for every tunable of the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploaderConfig {
    pub api: ApiConfig,
    pub limits: UploadLimits,
    pub poll: PollConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after the first one, for requests that got no response at all.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_millis(30_000),
            retries: 3,
            retry_delay: Duration::from_millis(1_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub allowed_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 500 * MIB,
            allowed_types: vec![
                "application/zip".to_string(),
                "application/x-zip-compressed".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Status poll cadence for the active job.
    pub job_interval: Duration,
    /// Refresh cadence for the history page.
    pub history_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            job_interval: Duration::from_millis(2_000),
            history_interval: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    pub default_page: u32,
    pub default_limit: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_limit: 10,
        }
    }
}
