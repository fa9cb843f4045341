//! Shared handler state.

use std::sync::Arc;

use executor::PipelineExecutor;
use pipeline::ServiceConfig;
use tokio_util::task::TaskTracker;

/// State shared by all handlers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Immutable service configuration.
    pub config: Arc<ServiceConfig>,
    /// The single executor; its lock serializes pipeline runs.
    pub executor: Arc<PipelineExecutor>,
    /// Every spawned pipeline run, so shutdown can wait for them.
    pub runs: TaskTracker,
}

impl AppState {
    /// Creates state with an empty run tracker.
    pub fn new(config: Arc<ServiceConfig>, executor: Arc<PipelineExecutor>) -> Self {
        Self {
            config,
            executor,
            runs: TaskTracker::new(),
        }
    }
}
