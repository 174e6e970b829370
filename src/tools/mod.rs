//! Shared state for the vendor API tool wrappers: access-token caching and
//! per-request call limiting. Both are plain objects owned by their caller.

pub mod cache;
pub mod limiter;

pub use cache::TtlCache;
pub use limiter::{CallLimiter, LimitExceeded, DEFAULT_CALL_WINDOW};

use crate::config::ToolsConfig;
use std::time::Duration;

/// Token cache and call limiter configured from `[tools]`.
pub struct ToolState {
    pub tokens: TtlCache<String>,
    pub limiter: CallLimiter,
    token_ttl: Duration,
}

impl ToolState {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            tokens: TtlCache::new(),
            limiter: CallLimiter::new(config.call_limit, Duration::from_secs(config.call_window_secs)),
            token_ttl: Duration::from_secs(config.token_ttl_secs),
        }
    }

    /// Cached token for `user_id`, or `refresh()` stored for the configured TTL.
    pub fn token_for<E>(
        &self,
        user_id: &str,
        refresh: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        if let Some(token) = self.tokens.get(user_id) {
            return Ok(token);
        }
        let token = refresh()?;
        self.tokens.set(user_id, token.clone(), self.token_ttl);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn token_is_refreshed_once_per_ttl() {
        let state = ToolState::from_config(&ToolsConfig::default());
        let refreshes = Cell::new(0);
        let refresh = || -> Result<String, String> {
            refreshes.set(refreshes.get() + 1);
            Ok(format!("tok-{}", refreshes.get()))
        };

        assert_eq!(state.token_for("u1", refresh).unwrap(), "tok-1");
        assert_eq!(state.token_for("u1", refresh).unwrap(), "tok-1");
        assert_eq!(refreshes.get(), 1);
        assert_eq!(state.token_for("u2", refresh).unwrap(), "tok-2");
    }

    #[test]
    fn refresh_errors_are_not_cached() {
        let state = ToolState::from_config(&ToolsConfig::default());
        let failed: Result<String, &str> = state.token_for("u1", || Err("expired grant"));
        assert_eq!(failed, Err("expired grant"));
        assert!(state.tokens.is_empty());
    }

    #[test]
    fn limiter_uses_configured_budget() {
        let state = ToolState::from_config(&ToolsConfig {
            call_limit: 1,
            ..ToolsConfig::default()
        });
        assert!(state.limiter.check("req-1").is_ok());
        assert!(state.limiter.check("req-1").is_err());
    }
}
