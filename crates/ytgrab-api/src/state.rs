//! Shared application state.

use std::sync::Arc;

use tokio_util::task::TaskTracker;

use ytgrab_media::MediaBackend;

use crate::config::ApiConfig;
use crate::registry::JobRegistry;

/// State handed to every handler via axum's `State` extractor.
///
/// Cloning is cheap; everything mutable lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub backend: Arc<dyn MediaBackend>,
    pub registry: Arc<JobRegistry>,
    /// Tracks spawned download workers so shutdown can wait for them.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(config: ApiConfig, backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            config,
            backend,
            registry: Arc::new(JobRegistry::new()),
            tasks: TaskTracker::new(),
        }
    }
}
