//! The fixed pool of feed slots.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::source::FeedSource;

/// Default number of slots.
pub const DEFAULT_SLOTS: usize = 5;

/// An ordered, fixed set of [`FeedSource`]s with ids `1..=N`.
///
/// Membership never changes after construction, so the registry needs no
/// lock of its own; each source guards its own state.  Cloning is cheap and
/// shares the same sources.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Arc<[FeedSource]>,
}

impl SourceRegistry {
    /// Create `slots` sources, configured from `config`, all stamped as
    /// last served at `now`.
    pub fn new(config: &Config, now: DateTime<Utc>) -> Self {
        let sources = (1..=config.slots.max(1))
            .map(|id| FeedSource::new(id, config.source_config(id), now))
            .collect();
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Source with the given 1-based id.
    pub fn get(&self, id: usize) -> Option<&FeedSource> {
        id.checked_sub(1).and_then(|i| self.sources.get(i))
    }

    /// Sources in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter()
    }

    /// Push each slot's configuration from `config` into its source.
    pub fn apply(&self, config: &Config) {
        for source in self.iter() {
            source.set_config(config.source_config(source.id()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedSourceConfig;
    use crate::testing::ts;

    fn config_with(urls: &[&str]) -> Config {
        Config {
            feeds: urls
                .iter()
                .map(|u| FeedSourceConfig {
                    url: u.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn creates_default_slot_count_with_sequential_ids() {
        let registry = SourceRegistry::new(&Config::default(), ts(0));
        assert_eq!(registry.len(), DEFAULT_SLOTS);
        let ids: Vec<_> = registry.iter().map(|s| s.id()).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
        assert!(registry.iter().all(|s| s.last_served_at() == ts(0)));
    }

    #[test]
    fn get_is_one_based() {
        let registry = SourceRegistry::new(&config_with(&["a", "b"]), ts(0));
        assert_eq!(registry.get(1).unwrap().config().url, "a");
        assert_eq!(registry.get(2).unwrap().config().url, "b");
        assert_eq!(registry.get(3).unwrap().config().url, "");
        assert!(registry.get(0).is_none());
        assert!(registry.get(6).is_none());
    }

    #[test]
    fn apply_rewrites_every_slot() {
        let registry = SourceRegistry::new(&config_with(&["a", "b"]), ts(0));
        registry.apply(&config_with(&["c"]));
        assert_eq!(registry.get(1).unwrap().config().url, "c");
        assert_eq!(registry.get(2).unwrap().config().url, "", "dropped feed unconfigures its slot");
    }

    #[test]
    fn clones_share_sources() {
        let registry = SourceRegistry::new(&Config::default(), ts(0));
        let other = registry.clone();
        other.get(1).unwrap().set_config(FeedSourceConfig {
            url: "shared".into(),
            ..Default::default()
        });
        assert_eq!(registry.get(1).unwrap().config().url, "shared");
    }
}
