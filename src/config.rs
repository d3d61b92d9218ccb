//! Configuration file parser for `rss-mixin.toml`.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Every key has a default, so any subset can be given.  Out-of-range values
//! are clamped into their bounds rather than rejected, by
//! [`Config::normalize`], which reports each change as an [`Adjustment`].
//! Loading does not clamp: the caller normalizes once logging is up, so the
//! adjustments can be logged.
//!
//! ```toml
//! poll_period_secs = 60
//! insert_period_secs = 3
//!
//! [[feeds]]
//! url = "https://feeds.bbci.co.uk/news/rss.xml"
//! reverse = true
//! ```

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::drain::DEFAULT_INSERT_PERIOD_SECS;
use crate::poll::DEFAULT_POLL_PERIOD_SECS;
use crate::registry::DEFAULT_SLOTS;

/// Allowed poll period, in seconds.
pub const POLL_PERIOD_BOUNDS: RangeInclusive<u64> = 1..=6000;
/// Allowed insert (drain) period, in seconds.
pub const INSERT_PERIOD_BOUNDS: RangeInclusive<u64> = 1..=600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// What one feed slot fetches and how it is drained.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedSourceConfig {
    /// Feed URL.  Empty means the slot is unused.
    pub url: String,
    /// Serve the newest queued entry first instead of the oldest.
    pub reverse: bool,
    /// Replay the whole feed again once its queue runs dry.
    pub loop_feed: bool,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between poll cycles.
    pub poll_period_secs: u64,
    /// Seconds between drain ticks.
    pub insert_period_secs: u64,
    /// Per-request HTTP timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Number of feed slots.
    pub slots: usize,
    /// Default log level; `RUST_LOG` takes precedence.
    pub log_level: String,
    pub log_file: PathBuf,
    /// Slot configurations, in slot order.
    pub feeds: Vec<FeedSourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_period_secs: DEFAULT_POLL_PERIOD_SECS,
            insert_period_secs: DEFAULT_INSERT_PERIOD_SECS,
            fetch_timeout_secs: 30,
            slots: DEFAULT_SLOTS,
            log_level: "info".into(),
            log_file: PathBuf::from("rss-mixin.log"),
            feeds: Vec::new(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Clamp every bounded field into range, returning what was changed or
    /// will be ignored.
    pub fn normalize(&mut self) -> Vec<Adjustment> {
        let mut adjustments = Vec::new();
        let mut clamp = |key: &'static str, value: &mut u64, bounds: RangeInclusive<u64>| {
            let clamped = (*value).clamp(*bounds.start(), *bounds.end());
            if clamped != *value {
                adjustments.push(Adjustment::Clamped {
                    key,
                    value: *value,
                    clamped,
                });
                *value = clamped;
            }
        };

        clamp("poll_period_secs", &mut self.poll_period_secs, POLL_PERIOD_BOUNDS);
        clamp("insert_period_secs", &mut self.insert_period_secs, INSERT_PERIOD_BOUNDS);
        clamp("fetch_timeout_secs", &mut self.fetch_timeout_secs, 1..=u64::MAX);

        if self.slots == 0 {
            adjustments.push(Adjustment::Clamped {
                key: "slots",
                value: 0,
                clamped: 1,
            });
            self.slots = 1;
        }
        if self.feeds.len() > self.slots {
            adjustments.push(Adjustment::ExtraFeeds {
                feeds: self.feeds.len(),
                slots: self.slots,
            });
        }
        adjustments
    }

    /// [`normalize`](Self::normalize), logging each adjustment.
    pub fn normalize_logged(&mut self) {
        for adjustment in self.normalize() {
            adjustment.log();
        }
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_secs)
    }

    pub fn insert_period(&self) -> Duration {
        Duration::from_secs(self.insert_period_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Configuration for slot `id` (1-based).  Slots with no `[[feeds]]`
    /// entry are unconfigured.
    pub fn source_config(&self, id: usize) -> FeedSourceConfig {
        id.checked_sub(1)
            .and_then(|i| self.feeds.get(i))
            .cloned()
            .unwrap_or_default()
    }
}

/// A change [`Config::normalize`] made, or a part of the config it ignores.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Adjustment {
    Clamped {
        key: &'static str,
        value: u64,
        clamped: u64,
    },
    /// Feeds past the last slot are never polled.
    ExtraFeeds { feeds: usize, slots: usize },
}

impl Adjustment {
    pub fn log(&self) {
        match *self {
            Adjustment::Clamped { key, value, clamped } => {
                warn!(key, value, clamped, "config value out of range");
            }
            Adjustment::ExtraFeeds { feeds, slots } => {
                warn!(feeds, slots, "more feeds configured than slots; ignoring the extra feeds");
            }
        }
    }
}
