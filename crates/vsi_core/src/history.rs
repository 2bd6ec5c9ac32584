//! History view-model: the page of past jobs and when to refresh it.
//!
//! The refresh tick only turns into a fetch while the page loaded *before* the tick still
//! shows an `Uploaded` or `Processing` job. A job submitted after that page was loaded is
//! therefore picked up at most one tick late.

use vsi_logging::vsi_warn;

use crate::{
    messages, sort_newest_first, Generation, HistoryConfig, HistoryQuery, JobStatus, UploadJob,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryMsg {
    /// The history view became visible.
    Mounted,
    FilterChanged(Option<JobStatus>),
    PageChanged(u32),
    /// Fixed-interval refresh timer fired.
    Tick,
    Loaded {
        generation: Generation,
        result: Result<Vec<UploadJob>, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEffect {
    Fetch {
        generation: Generation,
        query: HistoryQuery,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryState {
    generation: Generation,
    filter: Option<JobStatus>,
    page: u32,
    limit: u32,
    jobs: Vec<UploadJob>,
    loading: bool,
    error: Option<String>,
    dirty: bool,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryState {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            generation: 0,
            filter: None,
            page: config.default_page.max(1),
            limit: config.default_limit.max(1),
            jobs: Vec::new(),
            loading: true,
            error: None,
            dirty: false,
        }
    }

    pub fn with_filter(mut self, filter: Option<JobStatus>) -> Self {
        self.filter = filter;
        self
    }

    pub fn query(&self) -> HistoryQuery {
        HistoryQuery {
            status: self.filter,
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn jobs(&self) -> &[UploadJob] {
        &self.jobs
    }

    /// Whether the last loaded page still shows work in progress.
    pub fn has_in_flight(&self) -> bool {
        self.jobs.iter().any(|job| job.status.is_in_flight())
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> HistoryViewModel {
        HistoryViewModel {
            filter: self.filter,
            page: self.page,
            limit: self.limit,
            jobs: self.jobs.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }

    fn fetch(&mut self) -> HistoryEffect {
        HistoryEffect::Fetch {
            generation: self.generation,
            query: self.query(),
        }
    }

    /// New query parameters: results of the previous query are no longer wanted.
    fn restart(&mut self) -> HistoryEffect {
        self.generation += 1;
        self.loading = true;
        self.dirty = true;
        self.fetch()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryViewModel {
    pub filter: Option<JobStatus>,
    pub page: u32,
    pub limit: u32,
    pub jobs: Vec<UploadJob>,
    pub loading: bool,
    pub error: Option<String>,
}

pub fn update_history(
    mut state: HistoryState,
    msg: HistoryMsg,
) -> (HistoryState, Vec<HistoryEffect>) {
    let effects = match msg {
        HistoryMsg::Mounted => vec![state.restart()],
        HistoryMsg::FilterChanged(filter) => {
            if filter == state.filter {
                Vec::new()
            } else {
                state.filter = filter;
                vec![state.restart()]
            }
        }
        HistoryMsg::PageChanged(page) => {
            let page = page.max(1);
            if page == state.page {
                Vec::new()
            } else {
                state.page = page;
                vec![state.restart()]
            }
        }
        HistoryMsg::Tick => {
            if state.has_in_flight() {
                vec![state.fetch()]
            } else {
                Vec::new()
            }
        }
        HistoryMsg::Loaded { generation, result } => {
            if generation != state.generation {
                return (state, Vec::new());
            }
            state.loading = false;
            state.dirty = true;
            match result {
                Ok(mut jobs) => {
                    sort_newest_first(&mut jobs);
                    state.jobs = jobs;
                    state.error = None;
                }
                Err(message) => {
                    vsi_warn!("Failed to load upload history: {message}");
                    state.error = Some(messages::HISTORY_LOAD_ERROR.to_string());
                }
            }
            Vec::new()
        }
    };

    (state, effects)
}
