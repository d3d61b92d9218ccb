//! The data types that flow out of a feed poll.
//!
//! A parser produces a [`ParsedFeed`]: the feed's own metadata plus its raw
//! entries in feed order (usually newest first).  [`FeedSource`] turns the raw
//! entries it decides are new into immutable [`Entry`] values and queues them
//! for delivery.
//!
//! [`FeedSource`]: super::FeedSource

use chrono::{DateTime, Utc};

/// Icon used when a feed carries no image of its own.
pub const DEFAULT_ICON_URL: &str = "icon.png";

/// Feed-level metadata shared by every entry of one poll.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FeedMeta {
    /// Feed title, shown as the sender of each delivered message.
    pub title: String,
    /// Feed image URL, if the feed declares one.
    pub icon_url: Option<String>,
}

/// One entry exactly as the parser saw it.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    /// `None` when the feed gave no date or the date did not parse.
    pub published: Option<DateTime<Utc>>,
}

/// The result of parsing one feed document.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ParsedFeed {
    pub meta: FeedMeta,
    /// Entries in document order.
    pub entries: Vec<RawEntry>,
}

/// A queued feed entry, ready to be drained into the timeline.
///
/// Entries are immutable once built; a drain moves them out of the source
/// queue and into a [`Message`](crate::message::Message).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Entry {
    /// Human-readable headline.
    pub title: String,

    /// Summary or body text, when the feed provides one.
    pub summary: Option<String>,

    /// URL of the full article.
    pub link: Option<String>,

    /// Publication timestamp.  Undated entries are only ever admitted on the
    /// first poll after a reset.
    pub published: Option<DateTime<Utc>>,

    /// Title of the feed this entry came from.
    pub source_title: String,

    /// Icon of the feed this entry came from.
    pub source_icon_url: String,
}

impl Entry {
    /// Build an entry from a raw parser entry and its feed's metadata.
    ///
    /// Returns `None` for a malformed entry: one with neither a title nor a
    /// link has nothing worth delivering.
    pub fn from_raw(raw: RawEntry, meta: &FeedMeta) -> Option<Self> {
        let title = raw.title.filter(|t| !t.trim().is_empty());
        let link = raw.link.filter(|l| !l.trim().is_empty());
        if title.is_none() && link.is_none() {
            return None;
        }

        Some(Self {
            title: title.unwrap_or_else(|| "(untitled)".into()),
            summary: raw.summary,
            link,
            published: raw.published,
            source_title: meta.title.clone(),
            source_icon_url: meta
                .icon_url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_ICON_URL.into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta(icon: Option<&str>) -> FeedMeta {
        FeedMeta {
            title: "Example Feed".into(),
            icon_url: icon.map(String::from),
        }
    }

    #[test]
    fn from_raw_copies_fields_and_feed_metadata() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let raw = RawEntry {
            title: Some("Hello".into()),
            summary: Some("Body".into()),
            link: Some("https://example.com/1".into()),
            published: Some(ts),
        };

        let entry = Entry::from_raw(raw, &meta(Some("https://example.com/icon.png"))).unwrap();

        assert_eq!(entry.title, "Hello");
        assert_eq!(entry.summary.as_deref(), Some("Body"));
        assert_eq!(entry.link.as_deref(), Some("https://example.com/1"));
        assert_eq!(entry.published, Some(ts));
        assert_eq!(entry.source_title, "Example Feed");
        assert_eq!(entry.source_icon_url, "https://example.com/icon.png");
    }

    #[test]
    fn missing_icon_falls_back_to_default() {
        let raw = RawEntry {
            title: Some("t".into()),
            ..Default::default()
        };
        let entry = Entry::from_raw(raw, &meta(None)).unwrap();
        assert_eq!(entry.source_icon_url, DEFAULT_ICON_URL);

        let raw = RawEntry {
            title: Some("t".into()),
            ..Default::default()
        };
        let entry = Entry::from_raw(raw, &meta(Some(""))).unwrap();
        assert_eq!(entry.source_icon_url, DEFAULT_ICON_URL);
    }

    #[test]
    fn link_only_entry_gets_placeholder_title() {
        let raw = RawEntry {
            link: Some("https://example.com/x".into()),
            ..Default::default()
        };
        let entry = Entry::from_raw(raw, &meta(None)).unwrap();
        assert_eq!(entry.title, "(untitled)");
    }

    #[test]
    fn entry_without_title_or_link_is_malformed() {
        let raw = RawEntry {
            title: Some("   ".into()),
            summary: Some("orphan".into()),
            ..Default::default()
        };
        assert!(Entry::from_raw(raw, &meta(None)).is_none());
    }
}
