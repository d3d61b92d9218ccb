//! Background feed polling.
//!
//! On every tick the [`PollCoordinator`] asks each source in the registry to
//! poll, one after another.  A source that fails does not stop the others:
//! its failure becomes one diagnostic message in the timeline and the cycle
//! moves on.
//!
//! ## For contributors
//!
//! The poller is intentionally sequential: it fetches every source in slot
//! order, then rearms.  That bounds outbound requests to one at a time.  A
//! cycle runs on a blocking worker thread because [`FeedParser`]
//! implementations do synchronous I/O.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::message::{EventSink, Message};
use crate::registry::SourceRegistry;
use crate::schedule::{run_rearming, Period};
use crate::source::{FeedParser, PollOutcome};

/// Default seconds between poll cycles.
pub const DEFAULT_POLL_PERIOD_SECS: u64 = 60;

/// Summary of one poll cycle.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct PollReport {
    /// Entries queued across all sources.
    pub admitted: usize,
    /// Ids of sources whose poll failed.
    pub failed: Vec<usize>,
}

#[derive(Clone)]
pub struct PollCoordinator {
    registry: SourceRegistry,
    parser: Arc<dyn FeedParser>,
    sink: Arc<dyn EventSink>,
}

impl PollCoordinator {
    pub fn new(registry: SourceRegistry, parser: Arc<dyn FeedParser>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry,
            parser,
            sink,
        }
    }

    /// Run one full cycle on the calling thread.
    ///
    /// `cancel` is checked before each source, so a stop request waits for
    /// at most the fetch already in flight.
    pub fn poll_all(&self, cancel: &CancellationToken) -> PollReport {
        let mut report = PollReport::default();

        for source in self.registry.iter() {
            if cancel.is_cancelled() {
                debug!(next_source = source.id(), "poll cycle cancelled");
                break;
            }
            match source.poll(self.parser.as_ref()) {
                Ok(PollOutcome::Admitted(count)) => {
                    debug!(
                        source = source.id(),
                        count,
                        queued = source.queue_len(),
                        watermark = ?source.watermark(),
                        "polled"
                    );
                    report.admitted += count;
                }
                Ok(PollOutcome::Unconfigured) => {}
                Err(e) => {
                    warn!(source = source.id(), url = %e.url, error = %e.error, "failed to fetch feed");
                    self.sink.emit(Message::fetch_failed(source.id(), &e.url, Utc::now()));
                    report.failed.push(source.id());
                }
            }
        }

        report
    }

    /// Poll every `period` until `cancel` fires.
    pub async fn run(self, period: Period, cancel: CancellationToken) {
        info!(period_secs = period.get().as_secs(), "poller started");

        let stop = cancel.clone();
        run_rearming("poll", period, cancel, || {
            let this = self.clone();
            let stop = stop.clone();
            async move {
                match tokio::task::spawn_blocking(move || this.poll_all(&stop)).await {
                    Ok(report) => {
                        if report.admitted > 0 || !report.failed.is_empty() {
                            info!(
                                admitted = report.admitted,
                                failed = report.failed.len(),
                                "poll cycle complete"
                            );
                        }
                    }
                    Err(e) => error!(error = %e, "poll cycle panicked"),
                }
            }
        })
        .await;
    }
}
