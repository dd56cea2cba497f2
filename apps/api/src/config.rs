use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::throttle::{DEFAULT_LIMIT, DEFAULT_WINDOW};
use crate::chat::orchestrator::DEFAULT_HISTORY_LIMIT;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Unset is allowed: completions then fail with an auth error and fall back.
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_vision_model: String,
    pub ai_timeout: Duration,
    pub ai_max_attempts: u32,
    pub throttle_limit: u32,
    pub throttle_window: Duration,
    /// Zero disables the analysis cache.
    pub cache_ttl: Duration,
    pub chat_history_limit: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            ai_api_key: std::env::var("AI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            ai_base_url: env_or("AI_BASE_URL", "https://api.openai.com/v1"),
            ai_model: env_or("AI_MODEL", "gpt-4o-mini"),
            ai_vision_model: env_or("AI_VISION_MODEL", "gpt-4o"),
            ai_timeout: Duration::from_secs(parse_env("AI_TIMEOUT_SECS", 30)?),
            ai_max_attempts: parse_env("AI_MAX_ATTEMPTS", 2)?,
            throttle_limit: parse_env("THROTTLE_LIMIT", DEFAULT_LIMIT)?,
            throttle_window: Duration::from_secs(parse_env("THROTTLE_WINDOW_SECS", DEFAULT_WINDOW.as_secs())?),
            cache_ttl: Duration::from_secs(parse_env("CACHE_TTL_SECS", 300)?),
            chat_history_limit: parse_env("CHAT_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
