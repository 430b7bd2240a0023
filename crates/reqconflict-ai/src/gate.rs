//! Rate-limiting policy applied after each successful inference call.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Delay applied after every successful call to stay under an external quota.
pub const DEFAULT_CALL_DELAY: Duration = Duration::from_secs(4);

/// Pacing policy between inference calls.
///
/// Kept separate from the client so the pacing strategy can change without
/// touching call sites.
#[async_trait]
pub trait RateGate: Send + Sync {
    /// Wait until the next call is allowed.
    async fn pause(&self);
}

/// Fixed wait after each call.
#[derive(Debug, Clone, Copy)]
pub struct FixedIntervalGate {
    interval: Duration,
}

impl FixedIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for FixedIntervalGate {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_DELAY)
    }
}

#[async_trait]
impl RateGate for FixedIntervalGate {
    async fn pause(&self) {
        if !self.interval.is_zero() {
            debug!(delay_ms = self.interval.as_millis() as u64, "rate gate pause");
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// No pacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl RateGate for NoDelay {
    async fn pause(&self) {}
}
