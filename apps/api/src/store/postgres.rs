//! Postgres-backed `HealthDataStore`. Schema: `migrations/0001_health.sql`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::chat::{
    ChatMessage, ChatMessageRow, ChatSession, ChatSessionPatch, NewChatMessage,
};
use crate::models::insight::{AiInsight, NewAiInsight};
use crate::models::logs::{ExerciseEntry, FoodEntry, SleepEntry, WaterEntry};
use crate::models::user::{HealthGoals, UserBiometrics, UserRow};
use crate::store::{HealthDataStore, LogFilter, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgHealthStore {
    pool: PgPool,
}

impl PgHealthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthDataStore for PgHealthStore {
    async fn get_food_logs(&self, user_id: Uuid, filter: &LogFilter) -> StoreResult<Vec<FoodEntry>> {
        let rows = sqlx::query_as::<_, FoodEntry>(
            r#"
            SELECT calories, protein_g, carbs_g, fat_g, consumed_at
            FROM food_logs
            WHERE user_id = $1
              AND (consumed_at AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3
            ORDER BY consumed_at
            "#,
        )
        .bind(user_id)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_exercise_logs(
        &self,
        user_id: Uuid,
        filter: &LogFilter,
    ) -> StoreResult<Vec<ExerciseEntry>> {
        let rows = sqlx::query_as::<_, ExerciseEntry>(
            r#"
            SELECT duration_minutes, calories_burned, intensity, exercise_type, exercise_date
            FROM exercise_logs
            WHERE user_id = $1 AND exercise_date BETWEEN $2 AND $3
            ORDER BY exercise_date, created_at
            "#,
        )
        .bind(user_id)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_sleep_logs(
        &self,
        user_id: Uuid,
        filter: Option<&LogFilter>,
    ) -> StoreResult<Vec<SleepEntry>> {
        let rows = match filter {
            Some(filter) => {
                sqlx::query_as::<_, SleepEntry>(
                    r#"
                    SELECT total_sleep_hours, sleep_quality, sleep_date
                    FROM sleep_logs
                    WHERE user_id = $1 AND sleep_date BETWEEN $2 AND $3
                    ORDER BY sleep_date, created_at
                    "#,
                )
                .bind(user_id)
                .bind(filter.start)
                .bind(filter.end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SleepEntry>(
                    r#"
                    SELECT total_sleep_hours, sleep_quality, sleep_date
                    FROM sleep_logs
                    WHERE user_id = $1
                    ORDER BY sleep_date, created_at
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn get_water_logs(
        &self,
        user_id: Uuid,
        filter: Option<&LogFilter>,
    ) -> StoreResult<Vec<WaterEntry>> {
        let rows = match filter {
            Some(filter) => {
                sqlx::query_as::<_, WaterEntry>(
                    r#"
                    SELECT amount_ml, consumed_at
                    FROM water_logs
                    WHERE user_id = $1
                      AND (consumed_at AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3
                    ORDER BY consumed_at
                    "#,
                )
                .bind(user_id)
                .bind(filter.start)
                .bind(filter.end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, WaterEntry>(
                    "SELECT amount_ml, consumed_at FROM water_logs WHERE user_id = $1 ORDER BY consumed_at",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn get_health_goals(&self, user_id: Uuid) -> StoreResult<Option<HealthGoals>> {
        let goals = sqlx::query_as::<_, HealthGoals>(
            r#"
            SELECT daily_calories, daily_water_ml, sleep_hours, exercise_minutes
            FROM health_goals
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(goals)
    }

    async fn get_user_biometrics(&self, user_id: Uuid) -> StoreResult<UserBiometrics> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT name, weight_kg, height_cm, age, gender, activity_level
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("User {user_id} not found")))?;
        Ok(row.into())
    }

    async fn create_ai_insight(&self, insight: NewAiInsight) -> StoreResult<AiInsight> {
        let data_sources = serde_json::to_value(&insight.data_sources)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let actionable_items = serde_json::to_value(&insight.actionable_items)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let row = sqlx::query_as::<_, AiInsight>(
            r#"
            INSERT INTO ai_insights
                (id, user_id, insight_type, title, description, confidence_score,
                 data_sources, actionable_items)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(insight.user_id)
        .bind(&insight.insight_type)
        .bind(&insight.title)
        .bind(&insight.description)
        .bind(insight.confidence_score)
        .bind(&data_sources)
        .bind(&actionable_items)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_chat_session(&self, user_id: Uuid, title: &str) -> StoreResult<ChatSession> {
        let session = sqlx::query_as::<_, ChatSession>(
            r#"
            INSERT INTO chat_sessions (id, user_id, title, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn get_chat_session(&self, session_id: Uuid) -> StoreResult<ChatSession> {
        sqlx::query_as::<_, ChatSession>("SELECT * FROM chat_sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Chat session {session_id} not found")))
    }

    async fn update_chat_session(
        &self,
        session_id: Uuid,
        patch: ChatSessionPatch,
    ) -> StoreResult<ChatSession> {
        sqlx::query_as::<_, ChatSession>(
            r#"
            UPDATE chat_sessions
            SET is_active = COALESCE($2, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Chat session {session_id} not found")))
    }

    async fn create_chat_message(&self, message: NewChatMessage) -> StoreResult<ChatMessage> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_messages (id, session_id, role, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, role, content, rating, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.session_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_chat_message(&self, message_id: Uuid) -> StoreResult<ChatMessage> {
        sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, session_id, role, content, rating, created_at
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?
        .map(ChatMessage::from)
        .ok_or_else(|| StoreError::NotFound(format!("Chat message {message_id} not found")))
    }

    async fn list_chat_messages(
        &self,
        session_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessage>> {
        // seq breaks ties between messages inserted within the same clock tick
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, session_id, role, content, rating, created_at
            FROM (
                SELECT * FROM chat_messages
                WHERE session_id = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
            ) recent
            ORDER BY created_at, seq
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    async fn rate_chat_message(&self, message_id: Uuid, rating: i16) -> StoreResult<ChatMessage> {
        sqlx::query_as::<_, ChatMessageRow>(
            r#"
            UPDATE chat_messages SET rating = $2
            WHERE id = $1
            RETURNING id, session_id, role, content, rating, created_at
            "#,
        )
        .bind(message_id)
        .bind(rating)
        .fetch_optional(&self.pool)
        .await?
        .map(ChatMessage::from)
        .ok_or_else(|| StoreError::NotFound(format!("Chat message {message_id} not found")))
    }
}
