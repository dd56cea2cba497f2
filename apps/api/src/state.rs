use std::sync::Arc;

use crate::analysis::service::HealthAnalyzer;
use crate::chat::orchestrator::ChatOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Scores, analysis, recommendations and insights. Owns the throttle and cache.
    pub analyzer: Arc<HealthAnalyzer>,
    pub chat: Arc<ChatOrchestrator>,
}
