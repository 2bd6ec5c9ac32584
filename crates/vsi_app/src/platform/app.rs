use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::sync::mpsc::UnboundedReceiver;
use vsi_core::{
    messages, update, update_history, AppState, HistoryConfig, HistoryMsg, HistoryState, JobId, JobStatus,
    Msg, Phase, SelectedFile, UploaderConfig,
};
use vsi_engine::{
    ClientSettings, EngineEvent, EngineHandle, EngineSettings, ReqwestTransport, Transport,
    TransportError,
};
use vsi_logging::{vsi_debug, vsi_info, vsi_warn};

use super::effects::{translate, EffectRunner, Inbound};
use super::ui::render;

/// Exit code after Ctrl-C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

pub struct UploadOptions<'a> {
    pub file: &'a Path,
    pub media_type: Option<String>,
    pub retries: u32,
}

pub struct HistoryOptions {
    pub status: Option<JobStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub watch: bool,
}

fn build_engine(
    config: &UploaderConfig,
) -> anyhow::Result<(EngineHandle, UnboundedReceiver<EngineEvent>)> {
    let transport = ReqwestTransport::new(ClientSettings::from(&config.api))
        .with_context(|| format!("invalid API base url {:?}", config.api.base_url))?;
    Ok(EngineHandle::new(
        Arc::new(transport),
        EngineSettings::from(&config.poll),
    ))
}

pub(crate) fn describe_file(
    path: &Path,
    media_type: Option<String>,
) -> anyhow::Result<SelectedFile> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("cannot read {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let media_type = media_type.unwrap_or_else(|| {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string()
    });
    Ok(SelectedFile {
        path: path.to_path_buf(),
        name,
        media_type,
        size: metadata.len(),
    })
}

/// Owns the upload model and prints whatever changed after each message.
struct UploadSession {
    state: AppState,
    runner: EffectRunner,
    last_line: Option<String>,
}

impl UploadSession {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);

        for notification in state.take_notifications() {
            println!("{}", render::notification_line(&notification));
        }
        if state.consume_dirty() {
            let line = render::progress_line(&state.view());
            // Transfer progress arrives per chunk; only print visible changes.
            if self.last_line.as_deref() != Some(line.as_str()) {
                println!("{line}");
                self.last_line = Some(line);
            }
        }
        self.state = state;
    }

    /// Applies `msg` for its effects only; nothing is printed.
    fn close(&mut self, msg: Msg) {
        let (state, effects) = update(std::mem::take(&mut self.state), msg);
        self.runner.enqueue(effects);
        self.state = state;
    }
}

pub async fn run_upload(
    config: &UploaderConfig,
    options: UploadOptions<'_>,
) -> anyhow::Result<ExitCode> {
    let file = describe_file(options.file, options.media_type)?;
    let (engine, mut events) = build_engine(config)?;
    let mut session = UploadSession {
        state: AppState::with_limits(config.limits.clone()),
        runner: EffectRunner::new(engine),
        last_line: None,
    };

    session.dispatch(Msg::FileSelected(file));
    if session.state.phase() == Phase::Error {
        return Ok(ExitCode::FAILURE);
    }
    session.dispatch(Msg::StartClicked);

    let mut retries_left = options.retries;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let code = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                vsi_info!("Interrupted; cancelling upload");
                session.close(Msg::CancelClicked);
                println!("Upload cancelled.");
                break ExitCode::from(EXIT_INTERRUPTED);
            }
            event = events.recv() => {
                let Some(event) = event else {
                    bail!("engine stopped unexpectedly");
                };
                match translate(event, rand::random::<f64>()) {
                    Inbound::Upload(msg) => session.dispatch(msg),
                    Inbound::History(msg) => vsi_debug!("Ignoring {msg:?} during upload"),
                }
            }
        }

        match session.state.phase() {
            Phase::Completed => break ExitCode::SUCCESS,
            Phase::Error if retries_left > 0 => {
                retries_left -= 1;
                vsi_info!("Retrying upload ({retries_left} retries left)");
                session.dispatch(Msg::RetryClicked);
            }
            Phase::Error => break ExitCode::FAILURE,
            Phase::Idle | Phase::Uploading => {}
        }
    };

    session.close(Msg::Shutdown);
    session.runner.shutdown();
    Ok(code)
}

pub async fn run_status(config: &UploaderConfig, job_id: &str) -> anyhow::Result<ExitCode> {
    let transport = ReqwestTransport::new(ClientSettings::from(&config.api))
        .with_context(|| format!("invalid API base url {:?}", config.api.base_url))?;
    match transport.fetch_status(&JobId::from(job_id)).await {
        Ok(job) => {
            println!("{}", render::job_line(&job));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            vsi_warn!("Status request for job {job_id} failed: {err}");
            eprintln!("{}", status_failure_text(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Generic status failure line followed by what went wrong.
fn status_failure_text(err: &TransportError) -> String {
    format!("{}\n{}", messages::STATUS_UPDATE_ERROR, err.user_message())
}

pub async fn run_history(
    config: &UploaderConfig,
    options: HistoryOptions,
) -> anyhow::Result<ExitCode> {
    let (engine, mut events) = build_engine(config)?;
    let mut runner = EffectRunner::new(engine);
    let history_config = HistoryConfig {
        default_page: options.page.unwrap_or(config.history.default_page),
        default_limit: options.limit.unwrap_or(config.history.default_limit),
    };
    let mut state = HistoryState::new(history_config).with_filter(options.status);

    let (next, effects) = update_history(state, HistoryMsg::Mounted);
    state = next;
    runner.enqueue_history(effects);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let code = loop {
        let msg = tokio::select! {
            _ = &mut ctrl_c => break ExitCode::from(EXIT_INTERRUPTED),
            event = events.recv() => {
                let Some(event) = event else {
                    bail!("engine stopped unexpectedly");
                };
                match translate(event, 0.0) {
                    Inbound::History(msg) => msg,
                    Inbound::Upload(msg) => {
                        vsi_debug!("Ignoring {msg:?} in history view");
                        continue;
                    }
                }
            }
        };

        let loaded = matches!(msg, HistoryMsg::Loaded { .. });
        let (next, effects) = update_history(state, msg);
        state = next;
        runner.enqueue_history(effects);

        if state.consume_dirty() {
            let view = state.view();
            if !view.loading {
                print!("{}", render::history_table(&view));
            }
        }
        if !loaded || state.view().loading {
            continue;
        }

        let failed = state.view().error.is_some();
        if !options.watch {
            break if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
        if !state.has_in_flight() {
            vsi_info!("Nothing in flight; stopped watching");
            break ExitCode::SUCCESS;
        }
        runner.watch_history(true);
    };

    runner.watch_history(false);
    runner.shutdown();
    Ok(code)
}
