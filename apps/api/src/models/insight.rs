use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted insight. Only written by an explicit save call.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub insight_type: String,
    pub title: String,
    pub description: String,
    /// Between 0.0 and 1.0.
    pub confidence_score: f64,
    pub data_sources: Value,
    pub actionable_items: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAiInsight {
    pub user_id: Uuid,
    pub insight_type: String,
    pub title: String,
    pub description: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub actionable_items: Vec<String>,
}
