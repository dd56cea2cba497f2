//! Axum route handlers for the chat API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::chat::orchestrator::{ChatExchange, ImageAttachment};
use crate::errors::AppError;
use crate::routes::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(alias = "user_id")]
    pub user_id: String,
    pub title: Option<String>,
    #[serde(alias = "first_message")]
    pub first_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(default)]
    pub content: String,
    pub image: Option<ImageAttachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    #[serde(alias = "user_id")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub user_id: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateMessageRequest {
    #[serde(alias = "user_id")]
    pub user_id: String,
    pub rating: i16,
}

/// POST /api/v1/chat/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id(&request.user_id, "userId")?;
    let session = state
        .chat
        .create_session(
            user_id,
            request.title.as_deref(),
            request.first_message.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "success": true, "data": session })))
}

/// GET /api/v1/chat/sessions/:id/messages?user_id=
///
/// Works for closed sessions too.
pub async fn handle_get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<Value>, AppError> {
    let session_id = parse_id(&session_id, "session id")?;
    let user_id = parse_id(&params.user_id, "user_id")?;
    let (session, messages) = state
        .chat
        .get_messages(session_id, user_id, params.limit)
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": { "session": session, "messages": messages }
    })))
}

/// POST /api/v1/chat/sessions/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let session_id = parse_id(&session_id, "session id")?;
    let user_id = parse_id(&request.user_id, "userId")?;
    let exchange: ChatExchange = state
        .chat
        .send_message(session_id, user_id, &request.content, request.image)
        .await?;
    Ok(Json(json!({ "success": true, "data": exchange })))
}

/// POST /api/v1/chat/sessions/:id/close
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<CloseSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let session_id = parse_id(&session_id, "session id")?;
    let user_id = parse_id(&request.user_id, "userId")?;
    let session = state.chat.close_session(session_id, user_id).await?;
    Ok(Json(json!({ "success": true, "data": session })))
}

/// PATCH /api/v1/chat/messages/:id/rating
pub async fn handle_rate_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(request): Json<RateMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let message_id = parse_id(&message_id, "message id")?;
    let user_id = parse_id(&request.user_id, "userId")?;
    let message = state
        .chat
        .rate_message(message_id, user_id, request.rating)
        .await?;
    Ok(Json(json!({ "success": true, "data": message })))
}
