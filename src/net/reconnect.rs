//! Reconnect policy for live channels.
//!
//! Exponential backoff with jitter: attempt `n` waits somewhere in
//! `[ceiling / 2, ceiling]` where `ceiling = min(base * 2^(n-1), max)`.
//! After `max_retries` consecutive failures the channel stays closed.

use std::time::Duration;

use rand::Rng;

const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_BASE_DELAY_MS: u64 = 1000;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl ReconnectPolicy {
    /// A dropped channel stays closed until the session is re-established.
    #[must_use]
    pub fn disabled() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Upper bound of the wait before retry `attempt` (1-based).
    ///
    /// `None` once `attempt` exceeds `max_retries`.
    #[must_use]
    pub fn ceiling(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_retries {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        Some(delay)
    }

    /// Jittered wait before retry `attempt`, or `None` to give up.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        let ceiling = self.ceiling(attempt)?;
        let half = ceiling / 2;
        let spread = u64::try_from((ceiling - half).as_millis()).unwrap_or(u64::MAX);
        let jitter = rand::rng().random_range(0..=spread);
        Some(half + Duration::from_millis(jitter))
    }
}

#[cfg(test)]
#[path = "reconnect_test.rs"]
mod tests;
