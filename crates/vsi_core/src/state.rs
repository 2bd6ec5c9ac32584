use crate::view_model::{AppViewModel, CosmeticProgress};
use crate::{messages, Effect, Generation, JobId, JobStatus, SelectedFile, UploadLimits};

/// Highest value measured transfer progress may report.
pub(crate) const TRANSFER_CAP: f64 = 95.0;
const COSMETIC_FLOOR: f64 = 95.0;
const COSMETIC_SPAN: f64 = 4.0;
const COSMETIC_CEILING: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Error,
    Completed,
}

/// Sub-state of `Phase::Uploading`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStage {
    /// Bytes are still going out; no job exists yet.
    Transfer,
    /// The server accepted the file; its status is being polled.
    Polling { job_id: JobId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// Dismissable, transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// The single upload session. Only `update` mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    limits: UploadLimits,
    generation: Generation,
    file: Option<SelectedFile>,
    phase: Phase,
    stage: Option<UploadStage>,
    transfer_progress: f64,
    cosmetic_progress: Option<f64>,
    remote_status: Option<JobStatus>,
    error: Option<String>,
    notifications: Vec<Notification>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: UploadLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let processing = matches!(self.stage, Some(UploadStage::Polling { .. }))
            && self.remote_status == Some(JobStatus::Processing);
        AppViewModel {
            phase: self.phase,
            filename: self.file.as_ref().map(|file| file.name.clone()),
            file_size: self.file.as_ref().map(|file| file.size),
            transfer_progress: self.transfer_progress,
            cosmetic: self.cosmetic_progress.map(CosmeticProgress),
            progress: self.progress(),
            processing,
            job_id: self.job_id().cloned(),
            remote_status: self.remote_status,
            error: self.error.clone(),
            can_start: self.phase == Phase::Idle && self.file.is_some(),
            can_retry: self.phase == Phase::Error && self.file.is_some(),
            can_cancel: self.file.is_some() || self.phase == Phase::Uploading,
            dirty: self.dirty,
        }
    }

    /// Value shown on the progress bar.
    pub fn progress(&self) -> f64 {
        match self.phase {
            Phase::Completed => 100.0,
            Phase::Idle | Phase::Error => 0.0,
            Phase::Uploading => match self.cosmetic_progress {
                Some(cosmetic) => cosmetic.max(self.transfer_progress),
                None => self.transfer_progress,
            },
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stage(&self) -> Option<&UploadStage> {
        self.stage.as_ref()
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Job currently being polled, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match &self.stage {
            Some(UploadStage::Polling { job_id }) => Some(job_id),
            _ => None,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drains notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    pub(crate) fn is_transferring(&self, generation: Generation) -> bool {
        self.is_current(generation) && self.stage == Some(UploadStage::Transfer)
    }

    pub(crate) fn is_polling(&self, generation: Generation, job_id: &JobId) -> bool {
        self.is_current(generation) && self.job_id() == Some(job_id)
    }

    /// Effect that releases the active session's resources, if one is running.
    pub(crate) fn teardown(&self) -> Option<Effect> {
        (self.phase == Phase::Uploading).then_some(Effect::StopSession {
            generation: self.generation,
        })
    }

    /// Back to Idle with nothing selected. Any result still in flight becomes stale.
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.file = None;
        self.phase = Phase::Idle;
        self.stage = None;
        self.transfer_progress = 0.0;
        self.cosmetic_progress = None;
        self.remote_status = None;
        self.error = None;
        self.dirty = true;
    }

    pub(crate) fn set_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.dirty = true;
    }

    /// Starts a fresh attempt against the selected file.
    pub(crate) fn begin_upload(&mut self) -> Option<Effect> {
        let file = self.file.clone()?;
        self.generation += 1;
        self.phase = Phase::Uploading;
        self.stage = Some(UploadStage::Transfer);
        self.transfer_progress = 0.0;
        self.cosmetic_progress = None;
        self.remote_status = None;
        self.error = None;
        self.dirty = true;
        Some(Effect::SubmitUpload {
            generation: self.generation,
            file,
        })
    }

    /// Keeps measured progress monotonic and under the transfer cap.
    pub(crate) fn apply_transfer_progress(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        let capped = percent.clamp(0.0, TRANSFER_CAP);
        if capped > self.transfer_progress {
            self.transfer_progress = capped;
            self.dirty = true;
        }
    }

    pub(crate) fn accept_job(&mut self, job_id: JobId) {
        self.stage = Some(UploadStage::Polling { job_id });
        self.notify(NotificationKind::Info, messages::UPLOAD_ACCEPTED);
        self.dirty = true;
    }

    pub(crate) fn set_remote_status(&mut self, status: JobStatus) {
        if self.remote_status != Some(status) {
            self.remote_status = Some(status);
            self.dirty = true;
        }
    }

    /// Synthesized smoothing while the server works; not a measurement.
    pub(crate) fn apply_processing_jitter(&mut self, jitter: f64) {
        let sample = if jitter.is_finite() {
            jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let cosmetic = (COSMETIC_FLOOR + sample * COSMETIC_SPAN).min(COSMETIC_CEILING);
        self.cosmetic_progress = Some(cosmetic);
        self.dirty = true;
    }

    pub(crate) fn complete(&mut self) {
        self.phase = Phase::Completed;
        self.stage = None;
        self.cosmetic_progress = None;
        self.notify(NotificationKind::Success, messages::PROCESSING_COMPLETE);
        self.dirty = true;
    }

    /// Terminal error for the session. The file is kept so retry can reuse it.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.phase = Phase::Error;
        self.stage = None;
        self.transfer_progress = 0.0;
        self.cosmetic_progress = None;
        self.notify(NotificationKind::Error, message.clone());
        self.error = Some(message);
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notifications.push(Notification {
            kind,
            message: message.into(),
        });
    }
}
