use std::sync::Arc;

use crate::config::Config;
use crate::queue::worker::PollConfig;
use crate::queue::GenerationQueue;
use crate::session::SessionManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Registry of live document-editing sessions.
    pub sessions: SessionManager,
    /// Pluggable queue client. Production: `HttpQueueClient`; tests swap in
    /// a scripted mock.
    pub queue: Arc<dyn GenerationQueue>,
    pub config: Config,
    /// Poll interval and wall-clock deadline for generation drivers.
    pub poll: PollConfig,
}
