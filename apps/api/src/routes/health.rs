use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Liveness only. The completion service is probed separately at /api/v1/ai/health.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "health-api"
    }))
}
