//! Wires the registry, both coordinators, the parser and the sink together.
//!
//! ```text
//!               poll()                    pop()
//! PollCoordinator ──────► FeedSource ×N ◄────── DrainCoordinator
//!        │                 (queue,                     │
//!        │ fetch failure    watermark)                 │ delivered entry
//!        └────────────────────► EventSink ◄────────────┘
//! ```
//!
//! [`Aggregator::start`] spawns both timers onto a Tokio runtime and returns a
//! [`RunningAggregator`] that can be reconfigured live and shut down.

use std::sync::Arc;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::drain::DrainCoordinator;
use crate::message::EventSink;
use crate::poll::PollCoordinator;
use crate::registry::SourceRegistry;
use crate::schedule::Period;
use crate::source::FeedParser;

pub struct Aggregator {
    registry: SourceRegistry,
    poll: PollCoordinator,
    drain: DrainCoordinator,
    poll_period: Period,
    insert_period: Period,
}

impl Aggregator {
    pub fn new(config: &Config, parser: Arc<dyn FeedParser>, sink: Arc<dyn EventSink>) -> Self {
        let registry = SourceRegistry::new(config, Utc::now());
        Self {
            poll: PollCoordinator::new(registry.clone(), parser, sink.clone()),
            drain: DrainCoordinator::new(registry.clone(), sink),
            registry,
            poll_period: Period::new(config.poll_period()),
            insert_period: Period::new(config.insert_period()),
        }
    }

    /// Spawn the poll and drain timers on `runtime`.
    pub fn start(self, runtime: &Handle) -> RunningAggregator {
        let cancel = CancellationToken::new();
        info!(slots = self.registry.len(), "starting aggregator");

        let tasks = vec![
            runtime.spawn(self.poll.run(self.poll_period.clone(), cancel.clone())),
            runtime.spawn(self.drain.run(self.insert_period.clone(), cancel.clone())),
        ];

        RunningAggregator {
            registry: self.registry,
            poll_period: self.poll_period,
            insert_period: self.insert_period,
            cancel,
            tasks,
        }
    }
}

/// A started aggregator.  Dropping it without [`shutdown`](Self::shutdown)
/// leaves the timers running until the runtime itself stops.
pub struct RunningAggregator {
    registry: SourceRegistry,
    poll_period: Period,
    insert_period: Period,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningAggregator {
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Apply a new configuration.  Source changes are picked up by the next
    /// poll, period changes at the next rearm.  The slot count is fixed at
    /// startup.
    pub fn reconfigure(&self, config: &Config) {
        self.registry.apply(config);
        self.poll_period.set(config.poll_period());
        self.insert_period.set(config.insert_period());
        info!(
            poll_period_secs = config.poll_period_secs,
            insert_period_secs = config.insert_period_secs,
            "configuration applied"
        );
    }

    /// Stop both timers and wait for any cycle in progress to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "coordinator task failed");
            }
        }
        info!("aggregator stopped");
    }
}
