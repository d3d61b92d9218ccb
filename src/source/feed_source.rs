//! One feed slot: configuration, pending queue and dedup watermark.
//!
//! A [`FeedSource`] lives for the whole process.  The poll coordinator calls
//! [`poll()`](FeedSource::poll) to admit new entries, the drain coordinator
//! calls [`pop_at()`](FeedSource::pop_at) to take them out again.  Both sides only
//! touch the queue and watermark under the source's own lock, and the lock
//! is never held across the network fetch.
//!
//! ## Dedup
//!
//! The watermark is the publish time of the newest entry ever admitted since
//! the last reset.  A later poll only admits entries dated strictly after it.
//! Undated entries are admitted on the first poll after a reset and never
//! again, since nothing proves they are new.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{Entry, FeedParser};
use crate::config::FeedSourceConfig;
use crate::error::PollError;

/// What a successful poll did.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PollOutcome {
    /// No URL is configured; nothing was fetched.
    Unconfigured,
    /// The feed was fetched and this many entries were queued.
    Admitted(usize),
}

/// Mutable state guarded by the source lock.
#[derive(Debug)]
struct State {
    queue: VecDeque<Entry>,
    watermark: Option<DateTime<Utc>>,
    last_applied: FeedSourceConfig,
    last_served_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FeedSource {
    id: usize,
    /// Written by the settings surface, read once per poll/pop.
    config: RwLock<FeedSourceConfig>,
    state: Mutex<State>,
}

impl FeedSource {
    /// Create slot `id`.  `created_at` seeds the last-served time so that all
    /// slots start out equally eligible for draining.
    pub fn new(id: usize, config: FeedSourceConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            config: RwLock::new(config),
            state: Mutex::new(State {
                queue: VecDeque::new(),
                watermark: None,
                last_applied: FeedSourceConfig::default(),
                last_served_at: created_at,
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> FeedSourceConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration.  Takes effect at the next poll.
    pub fn set_config(&self, config: FeedSourceConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        self.lock().watermark
    }

    pub fn last_served_at(&self) -> DateTime<Utc> {
        self.lock().last_served_at
    }

    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// The last-served time if the queue has anything in it, read atomically.
    pub fn pending_since(&self) -> Option<DateTime<Utc>> {
        let state = self.lock();
        (!state.queue.is_empty()).then_some(state.last_served_at)
    }

    /// Fetch the feed and queue whatever is new since the last poll.
    ///
    /// A change of URL since the previous poll empties the queue and forgets
    /// the watermark first, so entries fetched under the old configuration
    /// are never mixed with the new one.  On `Err` the queue and watermark
    /// are exactly as they were after that reset.
    pub fn poll(&self, parser: &dyn FeedParser) -> Result<PollOutcome, PollError> {
        let config = self.config();

        {
            let mut state = self.lock();
            let changed = state.last_applied.url != config.url;
            state.last_applied = config.clone();
            if changed {
                info!(source = self.id, url = %config.url, "feed source changed, discarding queue");
                state.queue.clear();
                state.watermark = None;
            }
        }

        if config.url.is_empty() {
            return Ok(PollOutcome::Unconfigured);
        }

        // Network I/O happens without the lock held.
        let feed = parser.parse(&config.url).map_err(|error| PollError {
            url: config.url.clone(),
            error,
        })?;

        let mut state = self.lock();
        let watermark = state.watermark;

        let mut fresh: Vec<Entry> = feed
            .entries
            .into_iter()
            .filter_map(|raw| {
                let entry = Entry::from_raw(raw, &feed.meta);
                if entry.is_none() {
                    debug!(source = self.id, "skipping entry with no title and no link");
                }
                entry
            })
            .filter(|entry| match (watermark, entry.published) {
                (None, _) => true,
                (Some(mark), Some(published)) => published > mark,
                (Some(_), None) => false,
            })
            .collect();

        if fresh.is_empty() {
            debug!(source = self.id, "no new entries");
            return Ok(PollOutcome::Admitted(0));
        }

        if let Some(newest) = fresh.iter().filter_map(|e| e.published).max() {
            state.watermark = Some(watermark.map_or(newest, |mark| mark.max(newest)));
        }

        // Feeds list newest first; queue oldest first.
        fresh.reverse();
        let count = fresh.len();
        state.queue.extend(fresh);

        debug!(source = self.id, count, queued = state.queue.len(), "admitted new entries");
        Ok(PollOutcome::Admitted(count))
    }

    /// Take one entry, stamping the source as served at `now`.
    ///
    /// Newest-queued first when `reverse` is set, oldest-queued first
    /// otherwise.  An empty queue yields `None` and, in loop mode,
    /// forgets the watermark so the feed replays from the next poll.
    pub fn pop_at(&self, now: DateTime<Utc>) -> Option<Entry> {
        let config = self.config();
        let mut state = self.lock();

        let entry = if config.reverse {
            state.queue.pop_back()
        } else {
            state.queue.pop_front()
        };

        match entry {
            Some(entry) => {
                state.last_served_at = now;
                Some(entry)
            }
            None => {
                if config.loop_feed {
                    state.watermark = None;
                }
                None
            }
        }
    }

    /// In loop mode, forget the watermark once the queue has run dry.
    ///
    /// Returns `true` if the watermark was reset.
    pub fn rearm_if_exhausted(&self) -> bool {
        if !self.config().loop_feed {
            return false;
        }
        let mut state = self.lock();
        if state.queue.is_empty() && state.watermark.is_some() {
            state.watermark = None;
            debug!(source = self.id, "loop mode: feed exhausted, replaying on next poll");
            true
        } else {
            false
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation under the lock is all-or-nothing, so a poisoned
        // guard still holds a consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
