//! Per-user fixed-window request throttle for the expensive analysis endpoints.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_LIMIT: u32 = 5;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rate limit exceeded, retry after {retry_after}s")]
pub struct Throttled {
    /// Whole seconds until the window resets, rounded up.
    pub retry_after: u64,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    count: u32,
    reset_at: DateTime<Utc>,
}

pub struct RequestThrottle {
    limit: u32,
    window: chrono::Duration,
    windows: Mutex<HashMap<Uuid, RateLimitWindow>>,
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }
}

impl RequestThrottle {
    pub fn new(limit: u32, window: Duration) -> Self {
        let window = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::seconds(60));
        Self {
            limit: limit.max(1),
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, user_id: Uuid) -> Result<(), Throttled> {
        self.check_at(user_id, Utc::now()).await
    }

    /// Counts one request for `user_id` at `now`. The window opens on the first
    /// request; rejected requests do not extend it.
    pub async fn check_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), Throttled> {
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(user_id).or_insert(RateLimitWindow {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= entry.reset_at {
            *entry = RateLimitWindow {
                count: 0,
                reset_at: now + self.window,
            };
        }

        if entry.count >= self.limit {
            let remaining_ms = (entry.reset_at - now).num_milliseconds().max(0) as u64;
            let retry_after = remaining_ms.div_ceil(1000).max(1);
            debug!(%user_id, retry_after, "request throttled");
            return Err(Throttled { retry_after });
        }

        entry.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sixth_request_in_window_is_throttled() {
        let throttle = RequestThrottle::default();
        let user = Uuid::new_v4();
        let start = Utc::now();

        for i in 0..5 {
            let at = start + chrono::Duration::seconds(i);
            assert!(throttle.check_at(user, at).await.is_ok(), "call {i}");
        }

        let err = throttle
            .check_at(user, start + chrono::Duration::seconds(10))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, 50);
    }

    #[tokio::test]
    async fn test_retry_after_rounds_up() {
        let throttle = RequestThrottle::new(1, Duration::from_secs(60));
        let user = Uuid::new_v4();
        let start = Utc::now();
        throttle.check_at(user, start).await.unwrap();

        let err = throttle
            .check_at(user, start + chrono::Duration::milliseconds(500))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, 60);
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let throttle = RequestThrottle::default();
        let user = Uuid::new_v4();
        let start = Utc::now();
        for _ in 0..5 {
            throttle.check_at(user, start).await.unwrap();
        }
        assert!(throttle.check_at(user, start).await.is_err());

        let later = start + chrono::Duration::seconds(61);
        assert!(throttle.check_at(user, later).await.is_ok());
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let throttle = RequestThrottle::new(1, Duration::from_secs(60));
        let now = Utc::now();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        throttle.check_at(a, now).await.unwrap();
        assert!(throttle.check_at(a, now).await.is_err());
        assert!(throttle.check_at(b, now).await.is_ok());
    }
}
