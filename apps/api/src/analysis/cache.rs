//! TTL cache for assembled analysis payloads.
//!
//! Entries are checked for expiry on read and overwritten on recompute. There is
//! no eviction beyond that: keys are bounded by active users times analysis kinds.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::analysis::{AnalysisType, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: Uuid,
    pub analysis_type: AnalysisType,
    pub timeframe: Timeframe,
}

impl CacheKey {
    pub fn new(user_id: Uuid, analysis_type: AnalysisType, timeframe: Timeframe) -> Self {
        Self {
            user_id,
            analysis_type,
            timeframe,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    payload: T,
    created_at: DateTime<Utc>,
}

pub struct ResponseCache<T> {
    ttl: chrono::Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry<T>>>,
}

impl<T: Clone + Send + Sync> ResponseCache<T> {
    /// A zero `ttl` disables caching: nothing is stored and every read misses.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero()),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > chrono::Duration::zero()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<T> {
        self.get_at(key, Utc::now()).await
    }

    pub async fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if now - entry.created_at < self.ttl {
            debug!(user_id = %key.user_id, analysis_type = %key.analysis_type, "analysis cache hit");
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    pub async fn put(&self, key: CacheKey, payload: T) {
        self.put_at(key, payload, Utc::now()).await
    }

    pub async fn put_at(&self, key: CacheKey, payload: T, now: DateTime<Utc>) {
        if !self.is_enabled() {
            return;
        }
        self.entries.write().await.insert(
            key,
            CacheEntry {
                payload,
                created_at: now,
            },
        );
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
