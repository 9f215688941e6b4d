use std::time::Duration;

use rand::Rng;

/// Exponential backoff with full jitter, capped at ten minutes — the same
/// shape as the request queue's retry policy, reimplemented without a
/// message broker: `delay = uniform(0, min(max_delay, base * 2^attempt))`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(600),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Used for tasks waiting on a filesystem path to appear: fewer
    /// attempts, since an absent path usually means the caller should give
    /// up and report the resource as missing rather than keep polling.
    pub fn file_wait() -> Self {
        Self {
            max_attempts: 8,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The delay to wait before the given attempt number (0-indexed:
    /// `attempt` is the number of attempts already made).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = exp.min(self.max_delay);
        if !self.jitter || capped.is_zero() {
            return capped;
        }
        let millis = rand::thread_rng().gen_range(0..=capped.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_at_ten_minutes() {
        let policy = RetryPolicy::default();
        for attempt in 0..30 {
            assert!(policy.delay_for(attempt) <= Duration::from_secs(600));
        }
    }

    #[test]
    fn file_wait_has_fewer_attempts() {
        assert_eq!(RetryPolicy::file_wait().max_attempts, 8);
        assert_eq!(RetryPolicy::default().max_attempts, 15);
    }
}
