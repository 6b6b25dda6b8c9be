//! Injectable time source.
//!
//! The loop's only blocking point is the poll-interval sleep. Routing time
//! through a trait lets tests drive long convergence scenarios in
//! microseconds with a manually advanced clock.

use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Time and sleep capability used by the reconciliation loop.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspend for `period`.
    async fn sleep(&self, period: Duration);
}

/// Wall-clock implementation backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}
