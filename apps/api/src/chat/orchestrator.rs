//! Chat sessions: `open → (message exchange)* → closed`.
//!
//! A send persists the user message, builds a prompt from the last N messages
//! and a week of activity, gets a reply (or an apology), persists it and
//! touches the session. Sends to one session are serialized in-process so
//! messages land in call order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::fallback::{chat_apology, CHAT_APOLOGIES};
use crate::analysis::resilient::{GenerationSource, ResilientOrchestrator};
use crate::analysis::service::window_ending_at;
use crate::chat::strategy::{PromptStrategy, StrategyChain};
use crate::chat::titles::{clean_title, fallback_title};
use crate::chat::vision::NutritionBreakdown;
use crate::errors::AppError;
use crate::llm_client::prompts::{
    build_prompt, build_title_prompt, ActivitySnapshot, ImagePolicy, PromptMode, PromptProfile,
    TITLE_PARAMS,
};
use crate::llm_client::LlmError;
use crate::models::chat::{
    ChatMessage, ChatSession, ChatSessionPatch, MessageRole, NewChatMessage,
};
use crate::models::user::{HealthGoals, UserBiometrics};
use crate::scoring::domain::score_day;
use crate::scoring::trends::activity_streak;
use crate::store::{load_logs, HealthDataStore};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
const MAX_MESSAGE_CHARS: usize = 4000;
const ACTIVITY_WINDOW_DAYS: u32 = 7;
const MAX_READ_LIMIT: i64 = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    pub url: String,
    #[serde(default = "default_policy")]
    pub policy: ImagePolicy,
}

fn default_policy() -> ImagePolicy {
    ImagePolicy::Casual
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
    pub source: GenerationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'static str>,
}

struct Reply {
    text: String,
    source: GenerationSource,
    strategy: Option<&'static str>,
}

pub struct ChatOrchestrator {
    store: Arc<dyn HealthDataStore>,
    orchestrator: ResilientOrchestrator,
    history_limit: usize,
    session_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<dyn HealthDataStore>,
        orchestrator: ResilientOrchestrator,
        history_limit: usize,
    ) -> Self {
        Self {
            store,
            orchestrator,
            history_limit,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Opens a session. Without an explicit title one is generated from
    /// `first_message`, falling back to a keyword or dated title.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        title: Option<&str>,
        first_message: Option<&str>,
    ) -> Result<ChatSession, AppError> {
        self.store.get_user_biometrics(user_id).await?;

        let title = match (title.map(str::trim), first_message.map(str::trim)) {
            (Some(t), _) if !t.is_empty() => t.chars().take(120).collect(),
            (_, Some(first)) if !first.is_empty() => self.generate_title(first).await,
            _ => fallback_title("", Utc::now()),
        };

        let session = self.store.create_chat_session(user_id, &title).await?;
        info!(session_id = %session.id, %user_id, title = %session.title, "chat session opened");
        Ok(session)
    }

    async fn generate_title(&self, first_message: &str) -> String {
        let generated = self
            .orchestrator
            .generate(
                "session_title",
                &build_title_prompt(first_message),
                TITLE_PARAMS,
                String::new,
            )
            .await;
        clean_title(&generated.text).unwrap_or_else(|| fallback_title(first_message, Utc::now()))
    }

    async fn owned_session(&self, session_id: Uuid, user_id: Uuid) -> Result<ChatSession, AppError> {
        let session = self.store.get_chat_session(session_id).await?;
        if session.user_id != user_id {
            return Err(AppError::NotFound(format!("Chat session {session_id} not found")));
        }
        Ok(session)
    }

    async fn session_lock(&self, session_id: Uuid) -> Arc<Mutex<()>> {
        self.session_locks
            .lock()
            .await
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the map entry once no other send holds or waits on it. Clones are
    /// only handed out under the map lock, so the count cannot grow meanwhile.
    async fn release_session_lock(&self, session_id: Uuid, lock: Arc<Mutex<()>>) {
        let mut locks = self.session_locks.lock().await;
        let idle = locks
            .get(&session_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(entry) == 2);
        if idle {
            locks.remove(&session_id);
        }
    }

    /// One message exchange. Upstream failures never fail the send: the
    /// assistant message is then one of the apology templates.
    pub async fn send_message(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        content: &str,
        image: Option<ImageAttachment>,
    ) -> Result<ChatExchange, AppError> {
        let content = content.trim();
        validate_message(content, image.as_ref())?;

        let session = self.owned_session(session_id, user_id).await?;
        if !session.is_active {
            info!(%session_id, "message sent to a closed session, session stays closed");
        }

        let lock = self.session_lock(session_id).await;
        let exchange = {
            let _guard = lock.lock().await;
            self.exchange(session_id, user_id, content, image).await
        };
        self.release_session_lock(session_id, lock).await;
        exchange
    }

    async fn exchange(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        content: &str,
        image: Option<ImageAttachment>,
    ) -> Result<ChatExchange, AppError> {
        let stored_content = if content.is_empty() {
            "[image]".to_string()
        } else {
            content.to_string()
        };
        let user_message = self
            .store
            .create_chat_message(NewChatMessage {
                session_id,
                role: MessageRole::User,
                content: stored_content,
            })
            .await?;

        let history = self.history(session_id, user_message.id).await?;
        let (biometrics, goals, activity) = self.activity(user_id).await?;
        let profile = PromptProfile {
            biometrics: &biometrics,
            goals: goals.as_ref(),
        };

        let reply = match &image {
            None => self.text_reply(profile, content, &history, &activity).await,
            Some(attachment) => {
                self.image_reply(profile, content, attachment, &history, &activity)
                    .await
            }
        };

        let ai_message = self
            .store
            .create_chat_message(NewChatMessage {
                session_id,
                role: MessageRole::Assistant,
                content: reply.text,
            })
            .await?;

        self.store
            .update_chat_session(session_id, ChatSessionPatch::default())
            .await?;

        info!(
            %session_id,
            source = ?reply.source,
            strategy = reply.strategy.unwrap_or("chat"),
            "chat reply stored"
        );

        Ok(ChatExchange {
            user_message,
            ai_message,
            source: reply.source,
            strategy: reply.strategy,
        })
    }

    /// The last N messages before `current`, oldest first.
    async fn history(&self, session_id: Uuid, current: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        let fetched = self
            .store
            .list_chat_messages(session_id, self.history_limit as i64 + 1)
            .await?;
        let mut history: Vec<ChatMessage> = fetched.into_iter().filter(|m| m.id != current).collect();
        let excess = history.len().saturating_sub(self.history_limit);
        history.drain(..excess);
        Ok(history)
    }

    async fn activity(
        &self,
        user_id: Uuid,
    ) -> Result<(UserBiometrics, Option<HealthGoals>, ActivitySnapshot), AppError> {
        let today = Utc::now().date_naive();
        let filter = window_ending_at(today, ACTIVITY_WINDOW_DAYS)?;
        let store = self.store.as_ref();
        let (biometrics, goals, logs) = tokio::try_join!(
            store.get_user_biometrics(user_id),
            store.get_health_goals(user_id),
            load_logs(store, user_id, &filter),
        )?;

        let days = logs.daily_summaries(today, ACTIVITY_WINDOW_DAYS);
        let snapshot = ActivitySnapshot {
            today: score_day(&logs, today, &biometrics),
            streak: activity_streak(&days),
            days,
        };
        Ok((biometrics, goals, snapshot))
    }

    async fn text_reply(
        &self,
        profile: PromptProfile<'_>,
        content: &str,
        history: &[ChatMessage],
        activity: &ActivitySnapshot,
    ) -> Reply {
        let mode = PromptMode::Chat {
            message: content,
            history,
            activity,
        };
        let generated = self
            .orchestrator
            .generate("chat", &build_prompt(profile, &mode), mode.params(), || {
                random_apology().to_string()
            })
            .await;
        Reply {
            text: generated.text,
            source: generated.source,
            strategy: None,
        }
    }

    async fn image_reply(
        &self,
        profile: PromptProfile<'_>,
        content: &str,
        image: &ImageAttachment,
        history: &[ChatMessage],
        activity: &ActivitySnapshot,
    ) -> Reply {
        let chain = image_chain(profile, content, image, history, activity);
        match chain.run(self.orchestrator.gateway()).await {
            Ok(reply) => Reply {
                text: reply.text,
                source: GenerationSource::Ai,
                strategy: Some(reply.strategy),
            },
            Err(exhausted) => {
                warn!(
                    attempts = exhausted.attempts,
                    error_kind = exhausted.last.kind(),
                    "image reply chain exhausted, sending apology"
                );
                Reply {
                    text: random_apology().to_string(),
                    source: GenerationSource::Fallback,
                    strategy: None,
                }
            }
        }
    }

    /// Marks the session closed. Reads keep working afterwards.
    pub async fn close_session(&self, session_id: Uuid, user_id: Uuid) -> Result<ChatSession, AppError> {
        self.owned_session(session_id, user_id).await?;
        let session = self
            .store
            .update_chat_session(
                session_id,
                ChatSessionPatch {
                    is_active: Some(false),
                },
            )
            .await?;
        info!(%session_id, "chat session closed");
        Ok(session)
    }

    pub async fn get_messages(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<(ChatSession, Vec<ChatMessage>), AppError> {
        let session = self.owned_session(session_id, user_id).await?;
        let limit = limit.unwrap_or(MAX_READ_LIMIT).clamp(1, MAX_READ_LIMIT);
        let messages = self.store.list_chat_messages(session_id, limit).await?;
        Ok((session, messages))
    }

    /// Rates an assistant reply in one of the caller's sessions.
    pub async fn rate_message(
        &self,
        message_id: Uuid,
        user_id: Uuid,
        rating: i16,
    ) -> Result<ChatMessage, AppError> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation("rating must be between 1 and 5".to_string()));
        }
        let message = self.store.get_chat_message(message_id).await?;
        self.owned_session(message.session_id, user_id)
            .await
            .map_err(|_| AppError::NotFound(format!("Chat message {message_id} not found")))?;
        if message.role != MessageRole::Assistant {
            return Err(AppError::Validation(
                "only assistant messages can be rated".to_string(),
            ));
        }
        Ok(self.store.rate_chat_message(message_id, rating).await?)
    }
}

fn validate_message(content: &str, image: Option<&ImageAttachment>) -> Result<(), AppError> {
    if content.is_empty() && image.is_none() {
        return Err(AppError::Validation("message content cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message content exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }
    if let Some(image) = image {
        let url = image.url.trim();
        let supported = url.starts_with("https://")
            || url.starts_with("http://")
            || url.starts_with("data:image/");
        if !supported {
            return Err(AppError::Validation(
                "image url must be http(s) or a data:image URI".to_string(),
            ));
        }
    }
    Ok(())
}

fn random_apology() -> &'static str {
    chat_apology(rand::thread_rng().gen_range(0..CHAT_APOLOGIES.len()))
}

fn render_breakdown(text: &str) -> Result<String, LlmError> {
    NutritionBreakdown::parse(text).map(|b| b.render())
}

/// Nutrition breakdown: structured → casual-with-image → text-only.
/// Describe and casual: that mode → text-only.
fn image_chain(
    profile: PromptProfile<'_>,
    content: &str,
    image: &ImageAttachment,
    history: &[ChatMessage],
    activity: &ActivitySnapshot,
) -> StrategyChain {
    let image_strategy = |name: &'static str, policy: ImagePolicy| {
        let mode = PromptMode::Image {
            policy,
            message: content,
            image_url: image.url.trim(),
        };
        PromptStrategy::new(name, build_prompt(profile, &mode), mode.params())
    };

    let chain = match image.policy {
        ImagePolicy::NutritionBreakdown => StrategyChain::new()
            .then(
                image_strategy("structured", ImagePolicy::NutritionBreakdown)
                    .with_transform(render_breakdown),
            )
            .then(image_strategy("casual_with_image", ImagePolicy::Casual)),
        ImagePolicy::Describe => StrategyChain::new().then(image_strategy("describe", ImagePolicy::Describe)),
        ImagePolicy::Casual => StrategyChain::new().then(image_strategy("casual", ImagePolicy::Casual)),
    };

    let text_only_message = if content.is_empty() {
        "I shared a photo with you, but it could not be viewed.".to_string()
    } else {
        format!("{content}\n\n(I also shared a photo, but it could not be viewed.)")
    };
    let text_mode = PromptMode::Chat {
        message: &text_only_message,
        history,
        activity,
    };
    chain.then(PromptStrategy::new(
        "text_only",
        build_prompt(profile, &text_mode),
        text_mode.params(),
    ))
}
