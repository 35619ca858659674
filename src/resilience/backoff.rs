//! Exponential backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::ClientConfig;

/// Calculate the delay after `attempt` (1-based) has failed.
///
/// The first delay is `base_ms`, each further one doubles, capped at `max_ms`.
/// `jitter_percent` adds up to that share of the delay at random.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter_percent: u32) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = capped_delay.saturating_mul(u64::from(jitter_percent)) / 100;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..=jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Backoff parameters for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub max_ms: u64,
    pub jitter_percent: u32,
}

impl BackoffPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            base_ms: config.backoff_base_ms,
            max_ms: config.backoff_max_ms,
            jitter_percent: config.jitter_percent,
        }
    }

    /// Delay to sleep after the given failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms, self.jitter_percent)
    }

    /// Upper bound of the sleeps taken between `attempts` attempts.
    pub fn worst_case_total(&self, attempts: u32) -> Duration {
        let jitter = |ms: u64| ms + ms.saturating_mul(u64::from(self.jitter_percent)) / 100;
        (1..attempts)
            .map(|attempt| {
                let ms = self
                    .base_ms
                    .saturating_mul(2u64.saturating_pow(attempt - 1))
                    .min(self.max_ms);
                Duration::from_millis(jitter(ms))
            })
            .sum()
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
