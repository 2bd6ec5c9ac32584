//! Executes session effects: owns the in-flight transfer, the job poll loop and the
//! history refresh timer.
//!
//! At most one upload session is held at a time. Replacing or stopping it cancels its
//! token, which drops any in-flight request, and aborts its poll task. Tasks check the
//! token before emitting, so nothing arrives for a session after it was stopped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vsi_core::{Generation, HistoryQuery, JobId, PollConfig, UploadJob};
use vsi_logging::{vsi_debug, vsi_info, vsi_warn};

use crate::{HistoryPage, ProgressSink, SubmitReceipt, Transport, TransportError, UploadRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TransferProgress {
        generation: Generation,
        percent: f64,
    },
    Submitted {
        generation: Generation,
        result: Result<SubmitReceipt, TransportError>,
    },
    StatusPolled {
        generation: Generation,
        job_id: JobId,
        result: Result<UploadJob, TransportError>,
    },
    HistoryLoaded {
        generation: Generation,
        result: Result<HistoryPage, TransportError>,
    },
    HistoryTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub history_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

impl From<&PollConfig> for EngineSettings {
    fn from(poll: &PollConfig) -> Self {
        Self {
            poll_interval: poll.job_interval,
            history_interval: poll.history_interval,
        }
    }
}

struct ActiveSession {
    generation: Generation,
    cancel: CancellationToken,
    transfer: JoinHandle<()>,
    poll: Option<JoinHandle<()>>,
}

impl ActiveSession {
    fn teardown(self) {
        self.cancel.cancel();
        self.transfer.abort();
        if let Some(poll) = self.poll {
            poll.abort();
        }
    }
}

struct ChannelProgressSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<EngineEvent>,
    cancel: CancellationToken,
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, percent: f64) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.tx.send(EngineEvent::TransferProgress {
            generation: self.generation,
            percent,
        });
    }
}

/// Handle owning every background task of the uploader. Must be used inside a Tokio runtime.
pub struct EngineHandle {
    transport: Arc<dyn Transport>,
    settings: EngineSettings,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    session: Option<ActiveSession>,
    history_fetch: Option<JoinHandle<()>>,
    history_ticks: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(
        transport: Arc<dyn Transport>,
        settings: EngineSettings,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = Self {
            transport,
            settings,
            event_tx,
            session: None,
            history_fetch: None,
            history_ticks: None,
        };
        (handle, event_rx)
    }

    /// Starts uploading for `generation`, superseding any previous session.
    pub fn submit(&mut self, generation: Generation, request: UploadRequest) {
        self.release_session();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let transport = self.transport.clone();
        let event_tx = self.event_tx.clone();
        let transfer = tokio::spawn(async move {
            let sink = ChannelProgressSink {
                generation,
                tx: event_tx.clone(),
                cancel: token.clone(),
            };
            tokio::select! {
                _ = token.cancelled() => {
                    vsi_debug!("Transfer for generation {generation} cancelled");
                }
                result = transport.submit_upload(&request, &sink) => {
                    if !token.is_cancelled() {
                        let _ = event_tx.send(EngineEvent::Submitted { generation, result });
                    }
                }
            }
        });

        self.session = Some(ActiveSession {
            generation,
            cancel,
            transfer,
            poll: None,
        });
    }

    /// Begins the status poll for the job accepted under `generation`.
    ///
    /// The first status call happens one interval from now. Calls never overlap, and the
    /// loop ends on its own once a terminal status has been delivered.
    pub fn start_polling(&mut self, generation: Generation, job_id: JobId) {
        let Some(session) = self.session.as_mut().filter(|s| s.generation == generation) else {
            vsi_warn!("Not polling job {job_id}: generation {generation} is no longer active");
            return;
        };
        if let Some(previous) = session.poll.take() {
            previous.abort();
        }
        vsi_info!("Polling job {job_id} every {:?}", self.settings.poll_interval);
        session.poll = Some(tokio::spawn(poll_job(
            self.transport.clone(),
            self.event_tx.clone(),
            session.cancel.clone(),
            generation,
            job_id,
            self.settings.poll_interval,
        )));
    }

    /// Tears down the session of `generation`. Stale generations are ignored.
    pub fn stop(&mut self, generation: Generation) {
        match self.session.as_ref().map(|session| session.generation) {
            Some(active) if active == generation => self.release_session(),
            Some(active) => {
                vsi_debug!("Ignoring stop for generation {generation}; active is {active}")
            }
            None => {}
        }
    }

    /// Whether a session still holds a cancellation token or poll task.
    pub fn has_active_session(&self) -> bool {
        self.session.is_some()
    }

    /// Loads one history page. A newer request replaces one still in flight.
    pub fn fetch_history(&mut self, generation: Generation, query: HistoryQuery) {
        if let Some(previous) = self.history_fetch.take() {
            previous.abort();
        }
        let transport = self.transport.clone();
        let event_tx = self.event_tx.clone();
        self.history_fetch = Some(tokio::spawn(async move {
            let result = transport.fetch_history(&query).await;
            let _ = event_tx.send(EngineEvent::HistoryLoaded { generation, result });
        }));
    }

    /// Emits `HistoryTick` every history interval until stopped.
    pub fn start_history_ticks(&mut self) {
        if self.history_ticks.is_some() {
            return;
        }
        let interval = self.settings.history_interval;
        let event_tx = self.event_tx.clone();
        self.history_ticks = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if event_tx.send(EngineEvent::HistoryTick).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop_history_ticks(&mut self) {
        if let Some(ticks) = self.history_ticks.take() {
            ticks.abort();
        }
    }

    /// Releases every task and token.
    pub fn shutdown(&mut self) {
        self.release_session();
        self.stop_history_ticks();
        if let Some(fetch) = self.history_fetch.take() {
            fetch.abort();
        }
    }

    fn release_session(&mut self) {
        if let Some(session) = self.session.take() {
            vsi_debug!("Releasing session generation {}", session.generation);
            session.teardown();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn poll_job(
    transport: Arc<dyn Transport>,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    cancel: CancellationToken,
    generation: Generation,
    job_id: JobId,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = transport.fetch_status(&job_id) => result,
        };
        let terminal = matches!(&result, Ok(job) if job.status.is_terminal());
        if cancel.is_cancelled() {
            break;
        }
        let event = EngineEvent::StatusPolled {
            generation,
            job_id: job_id.clone(),
            result,
        };
        if event_tx.send(event).is_err() || terminal {
            break;
        }
    }
    vsi_debug!("Poll loop for job {job_id} finished");
}
