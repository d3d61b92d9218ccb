//! Self-rearming timers.
//!
//! A coordinator runs one full cycle, then sleeps for its period, then runs
//! again.  A slow cycle therefore delays the next one instead of overlapping
//! it.  The period is re-read before every sleep so a reconfiguration takes
//! effect from the next rearm.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A period shared between a running timer and whoever reconfigures it.
#[derive(Debug, Clone)]
pub struct Period {
    millis: Arc<AtomicU64>,
}

impl Period {
    pub fn new(period: Duration) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(to_millis(period))),
        }
    }

    pub fn get(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }

    pub fn set(&self, period: Duration) {
        self.millis.store(to_millis(period), Ordering::Relaxed);
    }
}

fn to_millis(period: Duration) -> u64 {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
}

/// Run `cycle` now and then again `period` after each completion, until
/// `cancel` fires.
///
/// Cancellation is observed between cycles; a cycle in progress always runs
/// to completion.
pub async fn run_rearming<F, Fut>(name: &str, period: Period, cancel: CancellationToken, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    while !cancel.is_cancelled() {
        cycle().await;

        let wait = period.get();
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }
    debug!(timer = name, "timer stopped");
}
