use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// `false` once closed. Closed sessions stay readable.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("assistant") {
            MessageRole::Assistant
        } else {
            MessageRole::User
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// 1-5, assistant messages only
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: String,
    pub content: String,
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        ChatMessage {
            id: row.id,
            session_id: row.session_id,
            role: MessageRole::parse(&row.role),
            content: row.content,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
}

/// Partial update for a chat session. `None` fields are left untouched;
/// `updated_at` is always bumped.
#[derive(Debug, Clone, Default)]
pub struct ChatSessionPatch {
    pub is_active: Option<bool>,
}
