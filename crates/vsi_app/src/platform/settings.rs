//! Optional RON settings file layered over the compiled-in defaults.
//!
//! Every field may be omitted; unknown fields are an error so typos do not pass silently.
//! Durations are written in milliseconds.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use vsi_core::UploaderConfig;
use vsi_logging::{vsi_debug, vsi_info};

pub const DEFAULT_SETTINGS_FILE: &str = "./vsi-upload.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    api: Option<ApiSection>,
    limits: Option<LimitsSection>,
    poll: Option<PollSection>,
    history: Option<HistorySection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiSection {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    retries: Option<u32>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsSection {
    max_file_size: Option<u64>,
    allowed_types: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PollSection {
    job_interval_ms: Option<u64>,
    history_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HistorySection {
    default_page: Option<u32>,
    default_limit: Option<u32>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Resolves the effective configuration.
///
/// An explicit `path` must exist. Without one, `./vsi-upload.ron` is read when present.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<UploaderConfig, ConfigError> {
    let file = match path {
        Some(path) => Some(read_file(path)?),
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.is_file() {
                Some(read_file(default_path)?)
            } else {
                vsi_debug!("No settings file at {:?}; using defaults", default_path);
                None
            }
        }
    };

    let mut config = UploaderConfig::default();
    if let Some(file) = file {
        apply_file(&mut config, file);
    }
    apply_overrides(&mut config, overrides);
    Ok(config)
}

fn read_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    vsi_info!("Loaded settings from {:?}", path);
    Ok(parsed)
}

fn parse(content: &str) -> Result<SettingsFile, ron::error::SpannedError> {
    ron::from_str(content)
}

fn apply_file(config: &mut UploaderConfig, file: SettingsFile) {
    if let Some(api) = file.api {
        if let Some(base_url) = api.base_url {
            config.api.base_url = base_url;
        }
        if let Some(ms) = api.timeout_ms {
            config.api.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = api.retries {
            config.api.retries = retries;
        }
        if let Some(ms) = api.retry_delay_ms {
            config.api.retry_delay = Duration::from_millis(ms);
        }
    }
    if let Some(limits) = file.limits {
        if let Some(max) = limits.max_file_size {
            config.limits.max_file_size = max;
        }
        if let Some(types) = limits.allowed_types {
            config.limits.allowed_types = types;
        }
    }
    if let Some(poll) = file.poll {
        if let Some(ms) = poll.job_interval_ms {
            config.poll.job_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = poll.history_interval_ms {
            config.poll.history_interval = Duration::from_millis(ms);
        }
    }
    if let Some(history) = file.history {
        if let Some(page) = history.default_page {
            config.history.default_page = page;
        }
        if let Some(limit) = history.default_limit {
            config.history.default_limit = limit;
        }
    }
}

fn apply_overrides(config: &mut UploaderConfig, overrides: &Overrides) {
    if let Some(base_url) = &overrides.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(ms) = overrides.timeout_ms {
        config.api.timeout = Duration::from_millis(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vsi_core::MIB;

    fn write_settings(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vsi-upload.ron");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_dir, path) = write_settings(
            r#"(
                api: Some((base_url: Some("https://scans.example.org/api"), retries: Some(1))),
                limits: Some((max_file_size: Some(1048576))),
            )"#,
        );
        let config = load(Some(&path), &Overrides::default()).unwrap();

        let mut expected = UploaderConfig::default();
        expected.api.base_url = "https://scans.example.org/api".to_string();
        expected.api.retries = 1;
        expected.limits.max_file_size = MIB;
        assert_eq!(config, expected);
    }

    #[test]
    fn command_line_wins_over_file() {
        let (_dir, path) = write_settings(
            r#"(api: Some((base_url: Some("http://file/api"), timeout_ms: Some(1000))))"#,
        );
        let overrides = Overrides {
            base_url: Some("http://flag/api".to_string()),
            timeout_ms: Some(2500),
        };
        let config = load(Some(&path), &overrides).unwrap();
        assert_eq!(config.api.base_url, "http://flag/api");
        assert_eq!(config.api.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn poll_and_history_sections_apply() {
        let (_dir, path) = write_settings(
            r#"(
                poll: Some((job_interval_ms: Some(500), history_interval_ms: Some(10000))),
                history: Some((default_limit: Some(25))),
            )"#,
        );
        let config = load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(config.poll.job_interval, Duration::from_millis(500));
        assert_eq!(config.poll.history_interval, Duration::from_secs(10));
        assert_eq!(config.history.default_page, 1);
        assert_eq!(config.history.default_limit, 25);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let (_dir, path) = write_settings(r#"(api: Some((base_uri: Some("typo"))))"#);
        let err = load(Some(&path), &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("absent.ron")), &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        assert!(parse("()").is_ok());
    }
}
