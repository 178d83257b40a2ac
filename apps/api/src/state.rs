use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every analysis owns its own inputs.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    pub config: Config,
}
