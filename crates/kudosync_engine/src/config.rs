//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for engine behavior.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Backoff policy for failed mutation dispatches.
    pub backoff: BackoffPolicy,
}

impl EngineConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Exponential backoff between retries of a failing mutation.
///
/// The delay after a mutation's n-th failed attempt is
/// `min(base * 2^n, cap)`. There is no attempt cap: a queued mutation
/// retries for as long as the engine is online, because dropping
/// user-submitted content is worse than retrying forever.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Base delay unit.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
}

impl BackoffPolicy {
    /// Creates a policy with the given base and cap.
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// A policy with no delays, for tests.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Delay to wait after `attempts` consecutive failures.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(30_000))
    }
}
