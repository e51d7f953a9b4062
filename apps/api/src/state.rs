use crate::analysis::Pipeline;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Holds no conversation data: chat sessions travel with each request.
#[derive(Clone)]
pub struct AppState {
    /// Generative-text, video-search and rasterizer backends behind trait objects.
    pub pipeline: Pipeline,
    pub config: Config,
}
