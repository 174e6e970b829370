use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default window after which a key's call count resets.
pub const DEFAULT_CALL_WINDOW: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("tool call limit reached for `{key}` ({limit} calls per {window_secs}s), retry in {retry_after_ms}ms")]
pub struct LimitExceeded {
    pub key: String,
    pub limit: u32,
    pub window_secs: u64,
    pub retry_after_ms: u64,
}

struct Bucket {
    window_start: Instant,
    calls: u32,
}

/// Counts tool calls per key and refuses calls past `limit` until the window
/// opened by the first call has elapsed.
pub struct CallLimiter {
    limit: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl CallLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Record one call for `key`, or refuse it.
    pub fn check(&self, key: &str) -> Result<(), LimitExceeded> {
        self.check_at(key, Instant::now())
    }

    /// Forget everything recorded for `key`.
    pub fn reset(&self, key: &str) {
        self.buckets.lock().remove(key);
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), LimitExceeded> {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            window_start: now,
            calls: 0,
        });

        let elapsed = now.saturating_duration_since(bucket.window_start);
        if elapsed >= self.window {
            bucket.window_start = now;
            bucket.calls = 0;
        }

        if bucket.calls >= self.limit {
            let retry_after = self.window.saturating_sub(elapsed);
            tracing::warn!(key, limit = self.limit, "Tool call limit reached");
            return Err(LimitExceeded {
                key: key.to_string(),
                limit: self.limit,
                window_secs: self.window.as_secs(),
                retry_after_ms: u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
            });
        }

        bucket.calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_refuses() {
        let limiter = CallLimiter::new(2, DEFAULT_CALL_WINDOW);
        let start = Instant::now();
        assert!(limiter.check_at("req", start).is_ok());
        assert!(limiter.check_at("req", start + Duration::from_secs(1)).is_ok());

        let err = limiter
            .check_at("req", start + Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(err.limit, 2);
        assert_eq!(err.window_secs, 15);
        assert_eq!(err.retry_after_ms, 10_000);
    }

    #[test]
    fn count_resets_after_window() {
        let limiter = CallLimiter::new(1, DEFAULT_CALL_WINDOW);
        let start = Instant::now();
        assert!(limiter.check_at("req", start).is_ok());
        assert!(limiter.check_at("req", start + Duration::from_secs(14)).is_err());
        assert!(limiter.check_at("req", start + Duration::from_secs(15)).is_ok());
        assert!(limiter.check_at("req", start + Duration::from_secs(16)).is_err());
    }

    #[test]
    fn keys_do_not_share_budget() {
        let limiter = CallLimiter::new(1, DEFAULT_CALL_WINDOW);
        let now = Instant::now();
        assert!(limiter.check_at("a", now).is_ok());
        assert!(limiter.check_at("b", now).is_ok());
        assert!(limiter.check_at("a", now).is_err());
    }

    #[test]
    fn reset_clears_key() {
        let limiter = CallLimiter::new(1, DEFAULT_CALL_WINDOW);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());
        limiter.reset("a");
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn error_message_names_key() {
        let limiter = CallLimiter::new(0, DEFAULT_CALL_WINDOW);
        let err = limiter.check("drive").unwrap_err();
        assert!(err.to_string().contains("`drive`"));
    }
}
