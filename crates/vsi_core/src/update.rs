use vsi_logging::{vsi_debug, vsi_info, vsi_warn};

use crate::{messages, validate_file, AppState, Effect, JobStatus, Msg, NotificationKind, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            // A new selection supersedes whatever was running.
            let effects: Vec<Effect> = state.teardown().into_iter().collect();
            state.reset();
            match validate_file(&file.media_type, file.size, state.limits()) {
                Ok(()) => state.set_file(file),
                Err(err) => {
                    vsi_info!(
                        "Rejected {} ({} bytes, {}): {:?}",
                        file.name,
                        file.size,
                        file.media_type,
                        err
                    );
                    state.fail(err.to_string());
                }
            }
            effects
        }
        Msg::StartClicked => match state.phase() {
            Phase::Idle if state.file().is_none() => {
                state.notify(NotificationKind::Error, messages::MISSING_FILE);
                Vec::new()
            }
            Phase::Idle => state.begin_upload().into_iter().collect(),
            Phase::Uploading | Phase::Error | Phase::Completed => Vec::new(),
        },
        Msg::RetryClicked => {
            if state.phase() == Phase::Error {
                state.begin_upload().into_iter().collect()
            } else {
                Vec::new()
            }
        }
        Msg::CancelClicked | Msg::Shutdown => {
            let effects: Vec<Effect> = state.teardown().into_iter().collect();
            state.reset();
            effects
        }
        Msg::TransferProgress {
            generation,
            percent,
        } => {
            if state.is_transferring(generation) {
                state.apply_transfer_progress(percent);
            }
            Vec::new()
        }
        Msg::UploadSubmitted { generation, result } => {
            if !state.is_transferring(generation) {
                vsi_debug!("Dropping stale upload result for generation {generation}");
                return (state, Vec::new());
            }
            match result {
                Ok(job_id) => {
                    vsi_info!("Upload accepted as job {job_id}");
                    state.accept_job(job_id.clone());
                    vec![Effect::StartPolling { generation, job_id }]
                }
                Err(message) => {
                    state.fail(message);
                    vec![Effect::StopSession { generation }]
                }
            }
        }
        Msg::StatusPolled {
            generation,
            job_id,
            result,
            jitter,
        } => {
            if !state.is_polling(generation, &job_id) {
                vsi_debug!("Dropping stale status for job {job_id} (generation {generation})");
                return (state, Vec::new());
            }
            match result {
                // Transient poll failures are tolerated; the next tick tries again.
                Err(message) => {
                    vsi_warn!("Status poll for job {job_id} failed: {message}");
                    Vec::new()
                }
                Ok(job) => {
                    state.set_remote_status(job.status);
                    match job.status {
                        JobStatus::Completed => {
                            state.complete();
                            vec![Effect::StopSession { generation }]
                        }
                        JobStatus::Failed => {
                            let message = job
                                .error_message
                                .filter(|text| !text.trim().is_empty())
                                .unwrap_or_else(|| messages::UPLOAD_FAILED.to_string());
                            state.fail(message);
                            vec![Effect::StopSession { generation }]
                        }
                        JobStatus::Processing => {
                            state.apply_processing_jitter(jitter);
                            Vec::new()
                        }
                        JobStatus::Uploaded => Vec::new(),
                    }
                }
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
