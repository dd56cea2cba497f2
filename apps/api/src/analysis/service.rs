//! Analysis and recommendation entry points.
//!
//! Pipeline per request: throttle → cache → store snapshot → scoring and trends
//! → prompt → resilient completion → response (cached on the way out).

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::cache::{CacheKey, ResponseCache};
use crate::analysis::fallback::{fallback_narrative, fallback_recommendations};
use crate::analysis::resilient::{GenerationSource, ResilientOrchestrator};
use crate::analysis::throttle::RequestThrottle;
use crate::errors::AppError;
use crate::llm_client::prompts::{build_prompt, PromptMode, PromptProfile};
use crate::llm_client::{parse_json_reply, LlmError};
use crate::models::analysis::{AnalysisType, Priority, Recommendation, Timeframe};
use crate::models::insight::{AiInsight, NewAiInsight};
use crate::models::logs::{DailySummary, LogCollection};
use crate::models::user::{HealthGoals, UserBiometrics};
use crate::scoring::domain::{score_day, HealthScoreCard};
use crate::scoring::trends::{activity_streak, analyze_score_series, metric_trends, Trend};
use crate::store::{load_logs, HealthDataStore, LogFilter};

pub const AI_CONFIDENCE: f64 = 0.85;
pub const FALLBACK_CONFIDENCE: f64 = 0.60;

/// Days of history behind `recommend`.
const RECOMMENDATION_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub analysis_type: AnalysisType,
    pub timeframe: Timeframe,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(flatten)]
    pub scores: HealthScoreCard,
    pub trends: Vec<Trend>,
    pub overall_trend: Trend,
    pub streak: u32,
    pub recommendations: Vec<Recommendation>,
    pub narrative: String,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    pub data: AnalysisData,
    pub from_cache: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
    pub source: GenerationSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveInsightRequest {
    pub insight_type: String,
    pub title: String,
    pub description: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub actionable_items: Vec<String>,
}

/// Everything a single request needs from the store.
struct Snapshot {
    biometrics: UserBiometrics,
    goals: Option<HealthGoals>,
    logs: LogCollection,
}

pub struct HealthAnalyzer {
    store: Arc<dyn HealthDataStore>,
    orchestrator: ResilientOrchestrator,
    throttle: RequestThrottle,
    cache: ResponseCache<AnalysisData>,
}

impl HealthAnalyzer {
    pub fn new(
        store: Arc<dyn HealthDataStore>,
        orchestrator: ResilientOrchestrator,
        throttle: RequestThrottle,
        cache: ResponseCache<AnalysisData>,
    ) -> Self {
        Self {
            store,
            orchestrator,
            throttle,
            cache,
        }
    }

    async fn snapshot(&self, user_id: Uuid, filter: &LogFilter) -> Result<Snapshot, AppError> {
        let store = self.store.as_ref();
        let (biometrics, goals, logs) = tokio::try_join!(
            store.get_user_biometrics(user_id),
            store.get_health_goals(user_id),
            load_logs(store, user_id, filter),
        )?;
        Ok(Snapshot {
            biometrics,
            goals,
            logs,
        })
    }

    /// Raw score card for one day. Not throttled.
    pub async fn scores(&self, user_id: Uuid, date: NaiveDate) -> Result<HealthScoreCard, AppError> {
        let snapshot = self.snapshot(user_id, &LogFilter::single_day(date)).await?;
        Ok(score_day(&snapshot.logs, date, &snapshot.biometrics))
    }

    /// Scores, trends and a narrative for `timeframe` ending at `end_date` (default today).
    ///
    /// Only requests for the current period use the cache, since the cache key
    /// does not carry an end date.
    pub async fn analyze(
        &self,
        user_id: Uuid,
        analysis_type: AnalysisType,
        timeframe: Timeframe,
        end_date: Option<NaiveDate>,
    ) -> Result<AnalysisResponse, AppError> {
        self.throttle.check(user_id).await?;

        let today = Utc::now().date_naive();
        let end = end_date.unwrap_or(today);
        let cacheable = end == today;
        let key = CacheKey::new(user_id, analysis_type, timeframe);

        if cacheable {
            if let Some(data) = self.cache.get(&key).await {
                return Ok(AnalysisResponse {
                    success: true,
                    data,
                    from_cache: true,
                    timestamp: Utc::now(),
                });
            }
        }

        let days = timeframe.days();
        let filter = window_ending_at(end, days)?;
        let snapshot = self.snapshot(user_id, &filter).await?;
        if snapshot.logs.is_empty() {
            debug!(%user_id, start = %filter.start, end = %filter.end, "no logs in window, scoring with defaults");
        }

        let summaries = snapshot.logs.daily_summaries(end, days);
        let card = score_day(&snapshot.logs, end, &snapshot.biometrics);
        let trends = metric_trends(&summaries);
        let overall_trend = overall_score_trend(&snapshot, &summaries);
        let streak = activity_streak(&summaries);

        let profile = PromptProfile {
            biometrics: &snapshot.biometrics,
            goals: snapshot.goals.as_ref(),
        };
        let mode = PromptMode::Analysis {
            analysis_type,
            timeframe,
            scores: &card,
            trends: &trends,
            days: &summaries,
        };
        let messages = build_prompt(profile, &mode);

        let narrative_trends: Vec<Trend> = trends
            .iter()
            .cloned()
            .chain(std::iter::once(overall_trend.clone()))
            .collect();
        let generated = self
            .orchestrator
            .generate("analysis", &messages, mode.params(), || {
                fallback_narrative(analysis_type, timeframe, &card, &narrative_trends, streak)
            })
            .await;

        let data = AnalysisData {
            analysis_type,
            timeframe,
            period_start: filter.start,
            period_end: filter.end,
            scores: card,
            trends,
            overall_trend,
            streak,
            recommendations: fallback_recommendations(&card, &snapshot.biometrics),
            narrative: generated.text,
            source: generated.source,
        };

        info!(
            %user_id,
            analysis_type = %analysis_type,
            timeframe = %timeframe,
            overall_score = card.overall_score,
            source = ?data.source,
            "analysis generated"
        );

        if cacheable {
            self.cache.put(key, data.clone()).await;
        }

        Ok(AnalysisResponse {
            success: true,
            data,
            from_cache: false,
            timestamp: Utc::now(),
        })
    }

    /// Prioritised recommendations from the last week of logs. Degrades to the
    /// templated set when the AI fails or returns nothing usable.
    pub async fn recommend(&self, user_id: Uuid) -> Result<RecommendationSet, AppError> {
        self.throttle.check(user_id).await?;

        let today = Utc::now().date_naive();
        let filter = window_ending_at(today, RECOMMENDATION_WINDOW_DAYS)?;
        let snapshot = self.snapshot(user_id, &filter).await?;

        let summaries = snapshot
            .logs
            .daily_summaries(today, RECOMMENDATION_WINDOW_DAYS);
        let card = score_day(&snapshot.logs, today, &snapshot.biometrics);
        let trends = metric_trends(&summaries);

        let profile = PromptProfile {
            biometrics: &snapshot.biometrics,
            goals: snapshot.goals.as_ref(),
        };
        let mode = PromptMode::Recommendations {
            scores: &card,
            trends: &trends,
            days: &summaries,
        };
        let messages = build_prompt(profile, &mode);

        let (recommendations, source) = self
            .orchestrator
            .generate_parsed(
                "recommendations",
                &messages,
                mode.params(),
                parse_recommendations,
                || fallback_recommendations(&card, &snapshot.biometrics),
            )
            .await;

        let confidence = match source {
            GenerationSource::Ai => AI_CONFIDENCE,
            GenerationSource::Fallback => FALLBACK_CONFIDENCE,
        };

        info!(%user_id, count = recommendations.len(), ?source, "recommendations generated");

        Ok(RecommendationSet {
            recommendations,
            confidence,
            generated_at: Utc::now(),
            source,
        })
    }

    /// Persists an insight the caller chose to keep.
    pub async fn save_insight(
        &self,
        user_id: Uuid,
        request: SaveInsightRequest,
    ) -> Result<AiInsight, AppError> {
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        if request.description.trim().is_empty() {
            return Err(AppError::Validation("description cannot be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&request.confidence_score) {
            return Err(AppError::Validation(
                "confidenceScore must be between 0 and 1".to_string(),
            ));
        }
        let insight_type = if request.insight_type.trim().is_empty() {
            "general".to_string()
        } else {
            request.insight_type.trim().to_string()
        };

        let insight = self
            .store
            .create_ai_insight(NewAiInsight {
                user_id,
                insight_type,
                title: request.title.trim().to_string(),
                description: request.description.trim().to_string(),
                confidence_score: request.confidence_score,
                data_sources: request.data_sources,
                actionable_items: request.actionable_items,
            })
            .await?;
        Ok(insight)
    }

    /// Direct gateway probe. Errors are surfaced, not replaced by a fallback.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        Ok(self.orchestrator.gateway().health_check().await?)
    }
}

/// Log window of `days` days ending at `end`. Dates too close to the calendar
/// minimum are rejected instead of overflowing.
pub(crate) fn window_ending_at(end: NaiveDate, days: u32) -> Result<LogFilter, AppError> {
    LogFilter::ending_at(end, days)
        .ok_or_else(|| AppError::Validation(format!("end date {end} is out of range")))
}

fn overall_score_trend(snapshot: &Snapshot, summaries: &[DailySummary]) -> Trend {
    let series: Vec<f64> = summaries
        .iter()
        .map(|day| score_day(&snapshot.logs, day.date, &snapshot.biometrics).overall_score as f64)
        .collect();
    analyze_score_series("overallScore", &series)
}

#[derive(Deserialize)]
struct RecommendationEnvelope {
    recommendations: Vec<Recommendation>,
}

/// Accepts a JSON array (fenced or bare) or `{"recommendations": [...]}`.
/// Free text becomes one `ai_insight` recommendation; an empty list is an error
/// so the caller falls back.
fn parse_recommendations(text: &str) -> Result<Vec<Recommendation>, LlmError> {
    let parsed = parse_json_reply::<Vec<Recommendation>>(text).or_else(|_| {
        parse_json_reply::<RecommendationEnvelope>(text).map(|e| e.recommendations)
    });

    match parsed {
        Ok(list) => {
            let list: Vec<Recommendation> = list
                .into_iter()
                .filter(|r| !r.description.trim().is_empty())
                .collect();
            if list.is_empty() {
                Err(LlmError::MalformedResponse(
                    "recommendation list was empty".to_string(),
                ))
            } else {
                Ok(list)
            }
        }
        Err(_) if !text.trim().is_empty() && !looks_like_json(text) => Ok(vec![Recommendation {
            kind: "ai_insight".to_string(),
            title: "Personalized insight".to_string(),
            description: text.trim().to_string(),
            priority: Priority::Medium,
            actionable: true,
            estimated_impact: String::new(),
            time_to_implement: String::new(),
        }]),
        Err(e) => Err(e),
    }
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('[') || trimmed.starts_with('{') || trimmed.starts_with("```")
}
