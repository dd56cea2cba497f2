//! In-memory `HealthDataStore` for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatSession, ChatSessionPatch, NewChatMessage};
use crate::models::insight::{AiInsight, NewAiInsight};
use crate::models::logs::{ExerciseEntry, FoodEntry, LogCollection, SleepEntry, WaterEntry};
use crate::models::user::{HealthGoals, UserBiometrics};
use crate::store::{HealthDataStore, LogFilter, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserBiometrics>,
    goals: HashMap<Uuid, HealthGoals>,
    logs: HashMap<Uuid, LogCollection>,
    insights: Vec<AiInsight>,
    sessions: HashMap<Uuid, ChatSession>,
    messages: Vec<ChatMessage>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_log_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user_id: Uuid, biometrics: UserBiometrics) {
        self.tables.lock().await.users.insert(user_id, biometrics);
    }

    pub async fn insert_goals(&self, user_id: Uuid, goals: HealthGoals) {
        self.tables.lock().await.goals.insert(user_id, goals);
    }

    pub async fn insert_logs(&self, user_id: Uuid, logs: LogCollection) {
        self.tables.lock().await.logs.insert(user_id, logs);
    }

    /// Makes every subsequent log read fail with a database error.
    pub fn fail_log_reads(&self) {
        self.fail_log_reads.store(true, Ordering::SeqCst);
    }

    pub async fn insights(&self) -> Vec<AiInsight> {
        self.tables.lock().await.insights.clone()
    }

    pub async fn all_messages(&self, session_id: Uuid) -> Vec<ChatMessage> {
        self.tables
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect()
    }

    fn check_log_reads(&self) -> StoreResult<()> {
        if self.fail_log_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn logs_for(&self, user_id: Uuid) -> LogCollection {
        self.tables
            .lock()
            .await
            .logs
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl HealthDataStore for InMemoryStore {
    async fn get_food_logs(&self, user_id: Uuid, filter: &LogFilter) -> StoreResult<Vec<FoodEntry>> {
        self.check_log_reads()?;
        Ok(self
            .logs_for(user_id)
            .await
            .food
            .into_iter()
            .filter(|f| filter.contains(f.consumed_at.date_naive()))
            .collect())
    }

    async fn get_exercise_logs(
        &self,
        user_id: Uuid,
        filter: &LogFilter,
    ) -> StoreResult<Vec<ExerciseEntry>> {
        self.check_log_reads()?;
        Ok(self
            .logs_for(user_id)
            .await
            .exercise
            .into_iter()
            .filter(|e| filter.contains(e.exercise_date))
            .collect())
    }

    async fn get_sleep_logs(
        &self,
        user_id: Uuid,
        filter: Option<&LogFilter>,
    ) -> StoreResult<Vec<SleepEntry>> {
        self.check_log_reads()?;
        Ok(self
            .logs_for(user_id)
            .await
            .sleep
            .into_iter()
            .filter(|s| filter.map_or(true, |f| f.contains(s.sleep_date)))
            .collect())
    }

    async fn get_water_logs(
        &self,
        user_id: Uuid,
        filter: Option<&LogFilter>,
    ) -> StoreResult<Vec<WaterEntry>> {
        self.check_log_reads()?;
        Ok(self
            .logs_for(user_id)
            .await
            .water
            .into_iter()
            .filter(|w| filter.map_or(true, |f| f.contains(w.consumed_at.date_naive())))
            .collect())
    }

    async fn get_health_goals(&self, user_id: Uuid) -> StoreResult<Option<HealthGoals>> {
        Ok(self.tables.lock().await.goals.get(&user_id).cloned())
    }

    async fn get_user_biometrics(&self, user_id: Uuid) -> StoreResult<UserBiometrics> {
        self.tables
            .lock()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("User {user_id} not found")))
    }

    async fn create_ai_insight(&self, insight: NewAiInsight) -> StoreResult<AiInsight> {
        let record = AiInsight {
            id: Uuid::new_v4(),
            user_id: insight.user_id,
            insight_type: insight.insight_type,
            title: insight.title,
            description: insight.description,
            confidence_score: insight.confidence_score,
            data_sources: serde_json::json!(insight.data_sources),
            actionable_items: serde_json::json!(insight.actionable_items),
            created_at: Utc::now(),
        };
        self.tables.lock().await.insights.push(record.clone());
        Ok(record)
    }

    async fn create_chat_session(&self, user_id: Uuid, title: &str) -> StoreResult<ChatSession> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_chat_session(&self, session_id: Uuid) -> StoreResult<ChatSession> {
        self.tables
            .lock()
            .await
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Chat session {session_id} not found")))
    }

    async fn update_chat_session(
        &self,
        session_id: Uuid,
        patch: ChatSessionPatch,
    ) -> StoreResult<ChatSession> {
        let mut tables = self.tables.lock().await;
        let session = tables
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| StoreError::NotFound(format!("Chat session {session_id} not found")))?;
        if let Some(is_active) = patch.is_active {
            session.is_active = is_active;
        }
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn create_chat_message(&self, message: NewChatMessage) -> StoreResult<ChatMessage> {
        let record = ChatMessage {
            id: Uuid::new_v4(),
            session_id: message.session_id,
            role: message.role,
            content: message.content,
            rating: None,
            created_at: Utc::now(),
        };
        self.tables.lock().await.messages.push(record.clone());
        Ok(record)
    }

    async fn get_chat_message(&self, message_id: Uuid) -> StoreResult<ChatMessage> {
        self.tables
            .lock()
            .await
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Chat message {message_id} not found")))
    }

    async fn list_chat_messages(
        &self,
        session_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let all = self.all_messages(session_id).await;
        let skip = all.len().saturating_sub(limit.max(0) as usize);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn rate_chat_message(&self, message_id: Uuid, rating: i16) -> StoreResult<ChatMessage> {
        let mut tables = self.tables.lock().await;
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| StoreError::NotFound(format!("Chat message {message_id} not found")))?;
        message.rating = Some(rating);
        Ok(message.clone())
    }
}
