use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::throttle::Throttled;
use crate::llm_client::LlmError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded, retry after {retry_after}s")]
    Throttled { retry_after: u64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Upstream AI error: {0}")]
    Upstream(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<Throttled> for AppError {
    fn from(t: Throttled) -> Self {
        AppError::Throttled {
            retry_after: t.retry_after,
        }
    }
}

fn upstream_status(e: &LlmError) -> (StatusCode, &'static str) {
    match e {
        LlmError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT"),
        LlmError::Auth(_) => (StatusCode::UNAUTHORIZED, "UPSTREAM_AUTH"),
        LlmError::RateLimited { .. } => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_RATE_LIMITED"),
        LlmError::Unavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE"),
        LlmError::Network(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_NETWORK"),
        LlmError::MalformedResponse(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_MALFORMED"),
        LlmError::Rejected { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_REJECTED"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Throttled { retry_after: secs } => {
                retry_after = Some(*secs);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "THROTTLED",
                    format!("Too many requests, retry after {secs} seconds"),
                )
            }
            AppError::Store(StoreError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone())
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Upstream(e) => {
                tracing::error!(error_kind = e.kind(), "Upstream AI error: {e}");
                if let LlmError::RateLimited { retry_after: Some(secs) } = e {
                    retry_after = Some(*secs);
                }
                let (status, code) = upstream_status(e);
                (status, code, e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "success": false,
            "error": {
                "code": code,
                "message": message
            }
        });
        if let Some(secs) = retry_after {
            body["retryAfter"] = json!(secs);
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_throttled_carries_retry_after() {
        let response = AppError::from(Throttled { retry_after: 42 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "THROTTLED");
        assert_eq!(body["retryAfter"], 42);
    }

    #[tokio::test]
    async fn test_store_not_found_is_404() {
        let response =
            AppError::from(StoreError::NotFound("User 1 not found".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body.get("retryAfter").is_none());
    }

    #[tokio::test]
    async fn test_upstream_timeout_maps_to_gateway_timeout() {
        let response =
            AppError::from(LlmError::Timeout(Duration::from_secs(30))).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_json(response).await["error"]["code"], "UPSTREAM_TIMEOUT");
    }
}
