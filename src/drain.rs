//! Fair draining of queued entries into the timeline.
//!
//! Each tick pops at most one entry, from the non-empty source that was
//! served least recently (ties go to the lower slot id).  A prolific feed
//! therefore cannot starve a quiet one: once served, it goes to the back of
//! the line.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::message::{EventSink, Message};
use crate::registry::SourceRegistry;
use crate::schedule::{run_rearming, Period};
use crate::source::FeedSource;

/// Default seconds between drain ticks.
pub const DEFAULT_INSERT_PERIOD_SECS: u64 = 3;

pub struct DrainCoordinator {
    registry: SourceRegistry,
    sink: Arc<dyn EventSink>,
}

impl DrainCoordinator {
    pub fn new(registry: SourceRegistry, sink: Arc<dyn EventSink>) -> Self {
        Self { registry, sink }
    }

    /// The non-empty source with the oldest last-served time.
    pub fn select(&self) -> Option<&FeedSource> {
        self.registry
            .iter()
            .filter_map(|source| source.pending_since().map(|since| (since, source.id(), source)))
            .min_by_key(|(since, id, _)| (*since, *id))
            .map(|(_, _, source)| source)
    }

    /// Run one tick at `now`: deliver one entry if any source has one.
    ///
    /// Returns the delivered message.
    pub fn drain_once_at(&self, now: DateTime<Utc>) -> Option<Message> {
        let delivered = self.select().and_then(|source| {
            let entry = source.pop_at(now)?;
            let message = Message::from_entry(entry, source.id(), now);
            debug!(
                source = source.id(),
                title = message.headline(),
                icon = %message.source_icon_url,
                system = message.is_system,
                "delivering entry"
            );
            Some(message)
        });

        if let Some(message) = &delivered {
            self.sink.emit(message.clone());
        }

        for source in self.registry.iter() {
            source.rearm_if_exhausted();
        }

        delivered
    }

    pub fn drain_once(&self) -> Option<Message> {
        self.drain_once_at(Utc::now())
    }

    /// Drain one entry every `period` until `cancel` fires.
    pub async fn run(self, period: Period, cancel: CancellationToken) {
        info!(period_secs = period.get().as_secs(), "drainer started");

        run_rearming("drain", period, cancel, || {
            self.drain_once();
            std::future::ready(())
        })
        .await;
    }
}
