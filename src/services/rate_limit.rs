//! In-process fixed-window rate limiter

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A window's counter for one key
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of a single `check`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub permitted: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Counts hits per key within a fixed window. Expired windows are swept
/// lazily on each check.
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn check(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, limit, window, Utc::now())
    }

    pub fn check_at(&self, key: &str, limit: u32, window: Duration, now: DateTime<Utc>) -> RateLimitDecision {
        let mut windows = self.lock();
        windows.retain(|_, w| now <= w.reset_at);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + window,
        });

        if entry.count >= limit {
            tracing::warn!(key, reset_at = %entry.reset_at, "Rate limit exceeded");
            return RateLimitDecision {
                permitted: false,
                remaining: 0,
                reset_at: entry.reset_at,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            permitted: true,
            remaining: limit.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    /// Number of live windows
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourth_hit_in_window_is_denied() {
        let limiter = RateLimiter::new();
        let now = Utc::now();
        let window = Duration::minutes(15);

        let remaining: Vec<_> = (0..3)
            .map(|_| limiter.check_at("contact:1.2.3.4", 3, window, now))
            .inspect(|d| assert!(d.permitted))
            .map(|d| d.remaining)
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let denied = limiter.check_at("contact:1.2.3.4", 3, window, now + Duration::minutes(1));
        assert!(!denied.permitted);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, now + window);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        let now = Utc::now();
        assert!(limiter.check_at("a", 1, Duration::seconds(60), now).permitted);
        assert!(!limiter.check_at("a", 1, Duration::seconds(60), now).permitted);
        assert!(limiter.check_at("b", 1, Duration::seconds(60), now).permitted);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = RateLimiter::new();
        let now = Utc::now();
        let window = Duration::seconds(10);
        for _ in 0..2 {
            limiter.check_at("k", 2, window, now);
        }
        assert!(!limiter.check_at("k", 2, window, now + window).permitted);

        let later = now + window + Duration::milliseconds(1);
        let decision = limiter.check_at("k", 2, window, later);
        assert!(decision.permitted);
        assert_eq!(decision.remaining, 1);
        assert_eq!(decision.reset_at, later + window);
    }

    #[test]
    fn test_expired_entries_are_swept() {
        let limiter = RateLimiter::new();
        let now = Utc::now();
        limiter.check_at("old", 3, Duration::seconds(1), now);
        assert_eq!(limiter.len(), 1);
        limiter.check_at("new", 3, Duration::seconds(1), now + Duration::seconds(5));
        assert_eq!(limiter.len(), 1);
    }
}
