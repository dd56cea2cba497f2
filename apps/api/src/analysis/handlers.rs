//! Axum route handlers for the scoring and analysis API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::service::{AnalysisResponse, RecommendationSet, SaveInsightRequest};
use crate::errors::AppError;
use crate::models::analysis::{AnalysisType, Timeframe};
use crate::models::insight::AiInsight;
use crate::routes::{parse_date, parse_id};
use crate::scoring::domain::HealthScoreCard;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    #[serde(rename = "type")]
    pub analysis_type: Option<String>,
    pub timeframe: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresResponse {
    pub success: bool,
    pub date: chrono::NaiveDate,
    pub data: HealthScoreCard,
}

/// GET /api/v1/users/:user_id/scores?date=YYYY-MM-DD
pub async fn handle_get_scores(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ScoresQuery>,
) -> Result<Json<ScoresResponse>, AppError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let date = match params.date.as_deref() {
        Some(raw) => parse_date(raw, "date")?,
        None => Utc::now().date_naive(),
    };

    let data = state.analyzer.scores(user_id, date).await?;
    Ok(Json(ScoresResponse {
        success: true,
        date,
        data,
    }))
}

/// GET /api/v1/users/:user_id/analysis?type=&timeframe=&end_date=
///
/// Defaults to a comprehensive weekly analysis ending today.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<AnalysisQuery>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let analysis_type = match params.analysis_type.as_deref() {
        Some(raw) => raw.parse::<AnalysisType>().map_err(AppError::Validation)?,
        None => AnalysisType::Comprehensive,
    };
    let timeframe = match params.timeframe.as_deref() {
        Some(raw) => raw.parse::<Timeframe>().map_err(AppError::Validation)?,
        None => Timeframe::Week,
    };
    let end_date = params
        .end_date
        .as_deref()
        .map(|raw| parse_date(raw, "end_date"))
        .transpose()?;

    let response = state
        .analyzer
        .analyze(user_id, analysis_type, timeframe, end_date)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/users/:user_id/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let set: RecommendationSet = state.analyzer.recommend(user_id).await?;
    Ok(Json(json!({ "success": true, "data": set })))
}

/// POST /api/v1/users/:user_id/insights
pub async fn handle_save_insight(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<SaveInsightRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let insight: AiInsight = state.analyzer.save_insight(user_id, request).await?;
    Ok(Json(json!({ "success": true, "data": insight })))
}

/// GET /api/v1/ai/health
///
/// Probes the completion service directly; failures are reported as errors.
pub async fn handle_ai_health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let healthy = state.analyzer.health_check().await?;
    Ok(Json(json!({
        "success": true,
        "data": { "healthy": healthy, "checkedAt": Utc::now() }
    })))
}
