pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};
use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::analysis::handlers as analysis;
use crate::chat::handlers as chat;
use crate::errors::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/ai/health", get(analysis::handle_ai_health))
        // Scoring & analysis
        .route(
            "/api/v1/users/:user_id/scores",
            get(analysis::handle_get_scores),
        )
        .route(
            "/api/v1/users/:user_id/analysis",
            get(analysis::handle_analyze),
        )
        .route(
            "/api/v1/users/:user_id/recommendations",
            get(analysis::handle_recommendations),
        )
        .route(
            "/api/v1/users/:user_id/insights",
            post(analysis::handle_save_insight),
        )
        // Chat
        .route("/api/v1/chat/sessions", post(chat::handle_create_session))
        .route(
            "/api/v1/chat/sessions/:id/messages",
            get(chat::handle_get_messages).post(chat::handle_send_message),
        )
        .route(
            "/api/v1/chat/sessions/:id/close",
            post(chat::handle_close_session),
        )
        .route(
            "/api/v1/chat/messages/:id/rating",
            patch(chat::handle_rate_message),
        )
        .with_state(state)
}

/// Parses a path or body id, rejecting malformed values before any I/O.
pub fn parse_id(raw: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("{field} must be a valid UUID")))
}

/// Parses a `YYYY-MM-DD` date.
/// Four-digit years only; chrono also parses signed extended years.
pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .filter(|date| (1..=9999).contains(&date.year()))
        .ok_or_else(|| AppError::Validation(format!("{field} must be a date in YYYY-MM-DD format")))
}
