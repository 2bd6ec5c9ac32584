use vsi_core::{Effect, HistoryEffect, HistoryMsg, Msg};
use vsi_engine::{EngineEvent, EngineHandle, UploadRequest};
use vsi_logging::{vsi_info, vsi_warn};

/// Runs the effects produced by `update`/`update_history` against the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitUpload { generation, file } => {
                    vsi_info!(
                        "SubmitUpload generation={} file={} size={}",
                        generation,
                        file.name,
                        file.size
                    );
                    self.engine.submit(generation, UploadRequest::from(&file));
                }
                Effect::StartPolling { generation, job_id } => {
                    self.engine.start_polling(generation, job_id);
                }
                Effect::StopSession { generation } => {
                    self.engine.stop(generation);
                }
            }
        }
    }

    pub fn enqueue_history(&mut self, effects: Vec<HistoryEffect>) {
        for effect in effects {
            match effect {
                HistoryEffect::Fetch { generation, query } => {
                    self.engine.fetch_history(generation, query);
                }
            }
        }
    }

    pub fn watch_history(&mut self, enabled: bool) {
        if enabled {
            self.engine.start_history_ticks();
        } else {
            self.engine.stop_history_ticks();
        }
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}

/// An engine event, addressed to the model that consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Upload(Msg),
    History(HistoryMsg),
}

/// Turns an engine event into a message. Transport failures become their user-facing text.
///
/// `jitter` is only used for status results; pass a fresh uniform sample in `[0, 1)`.
pub fn translate(event: EngineEvent, jitter: f64) -> Inbound {
    match event {
        EngineEvent::TransferProgress {
            generation,
            percent,
        } => Inbound::Upload(Msg::TransferProgress {
            generation,
            percent,
        }),
        EngineEvent::Submitted { generation, result } => Inbound::Upload(Msg::UploadSubmitted {
            generation,
            result: result.map(|receipt| receipt.job_id).map_err(|err| {
                vsi_warn!("Upload failed: {err}");
                err.user_message()
            }),
        }),
        EngineEvent::StatusPolled {
            generation,
            job_id,
            result,
        } => Inbound::Upload(Msg::StatusPolled {
            generation,
            job_id,
            result: result.map_err(|err| err.user_message()),
            jitter,
        }),
        EngineEvent::HistoryLoaded { generation, result } => {
            Inbound::History(HistoryMsg::Loaded {
                generation,
                result: result.map(|page| page.jobs).map_err(|err| err.user_message()),
            })
        }
        EngineEvent::HistoryTick => Inbound::History(HistoryMsg::Tick),
    }
}
