//! Health data store port.
//!
//! Everything the engine reads or writes outside its own process goes through
//! `HealthDataStore`. The Postgres adapter is the production implementation;
//! tests use the in-memory one.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use thiserror::Error;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatSession, ChatSessionPatch, NewChatMessage};
use crate::models::insight::{AiInsight, NewAiInsight};
use crate::models::logs::{ExerciseEntry, FoodEntry, LogCollection, SleepEntry, WaterEntry};
use crate::models::user::{HealthGoals, UserBiometrics};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored data: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Inclusive date range applied to log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LogFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// `days` days ending at `end`, inclusive. `None` when the window would
    /// start before the earliest representable date.
    pub fn ending_at(end: NaiveDate, days: u32) -> Option<Self> {
        let span = u64::from(days.max(1)) - 1;
        let start = end.checked_sub_days(Days::new(span))?;
        Some(Self::new(start, end))
    }

    #[cfg(test)]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[async_trait]
pub trait HealthDataStore: Send + Sync {
    // --- Logs ---
    async fn get_food_logs(&self, user_id: Uuid, filter: &LogFilter) -> StoreResult<Vec<FoodEntry>>;

    async fn get_exercise_logs(
        &self,
        user_id: Uuid,
        filter: &LogFilter,
    ) -> StoreResult<Vec<ExerciseEntry>>;

    async fn get_sleep_logs(
        &self,
        user_id: Uuid,
        filter: Option<&LogFilter>,
    ) -> StoreResult<Vec<SleepEntry>>;

    async fn get_water_logs(
        &self,
        user_id: Uuid,
        filter: Option<&LogFilter>,
    ) -> StoreResult<Vec<WaterEntry>>;

    // --- User ---
    async fn get_health_goals(&self, user_id: Uuid) -> StoreResult<Option<HealthGoals>>;

    async fn get_user_biometrics(&self, user_id: Uuid) -> StoreResult<UserBiometrics>;

    // --- Insights ---
    async fn create_ai_insight(&self, insight: NewAiInsight) -> StoreResult<AiInsight>;

    // --- Chat ---
    async fn create_chat_session(&self, user_id: Uuid, title: &str) -> StoreResult<ChatSession>;

    async fn get_chat_session(&self, session_id: Uuid) -> StoreResult<ChatSession>;

    async fn update_chat_session(
        &self,
        session_id: Uuid,
        patch: ChatSessionPatch,
    ) -> StoreResult<ChatSession>;

    async fn create_chat_message(&self, message: NewChatMessage) -> StoreResult<ChatMessage>;

    async fn get_chat_message(&self, message_id: Uuid) -> StoreResult<ChatMessage>;

    /// The last `limit` messages of a session, returned in creation order.
    async fn list_chat_messages(&self, session_id: Uuid, limit: i64)
        -> StoreResult<Vec<ChatMessage>>;

    async fn rate_chat_message(&self, message_id: Uuid, rating: i16) -> StoreResult<ChatMessage>;
}

/// Fetches all four log kinds for one window in a single snapshot.
pub async fn load_logs(
    store: &dyn HealthDataStore,
    user_id: Uuid,
    filter: &LogFilter,
) -> StoreResult<LogCollection> {
    let (food, exercise, sleep, water) = tokio::try_join!(
        store.get_food_logs(user_id, filter),
        store.get_exercise_logs(user_id, filter),
        store.get_sleep_logs(user_id, Some(filter)),
        store.get_water_logs(user_id, Some(filter)),
    )?;

    Ok(LogCollection {
        food,
        exercise,
        sleep,
        water,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_ending_at_week() {
        let end = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let filter = LogFilter::ending_at(end, 7).unwrap();
        assert_eq!(filter.start, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert!(filter.contains(end));
        assert!(!filter.contains(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()));
    }

    #[test]
    fn test_log_filter_zero_days_is_single_day() {
        let end = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(LogFilter::ending_at(end, 0), Some(LogFilter::single_day(end)));
    }

    #[test]
    fn test_log_filter_before_min_date_is_none() {
        assert_eq!(LogFilter::ending_at(NaiveDate::MIN, 1), Some(LogFilter::single_day(NaiveDate::MIN)));
        assert!(LogFilter::ending_at(NaiveDate::MIN, 7).is_none());
        let near_min = NaiveDate::MIN + chrono::Days::new(3);
        assert!(LogFilter::ending_at(near_min, 30).is_none());
    }
}
