//! Outbound timeline messages and the sink they are emitted to.
//!
//! Both coordinators talk to the outside world only through [`EventSink`]:
//! the drain coordinator emits delivered entries, the poll coordinator emits
//! one diagnostic per failing source per cycle.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::source::{Entry, DEFAULT_ICON_URL};

/// Suffix appended to delivered entry text; the link it stands for is
/// carried in [`Message::feed_link`].
pub const READ_MORE: &str = "[read more]";

/// A message destined for the timeline.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Message {
    /// Body text.
    pub text: String,
    /// Entry summary, when the feed gave one.
    pub summary: Option<String>,
    /// System messages come from the aggregator itself, not from a person.
    /// Fetch-failure notices set [`Message::is_error`] as well.
    pub is_system: bool,
    pub is_error: bool,
    pub source_icon_url: String,
    /// Sender name shown next to the text (the feed title, or `Error`).
    pub source_name: String,
    /// Entry publish time, falling back to the delivery time.
    pub created_at: DateTime<Utc>,
    /// When the drain coordinator handed this message to the sink.
    pub delivered_at: DateTime<Utc>,
    pub feed_link: Option<String>,
    /// Slot the message originated from.
    pub source_id: usize,
}

impl Message {
    /// Wrap a drained entry for delivery.
    pub fn from_entry(entry: Entry, source_id: usize, now: DateTime<Utc>) -> Self {
        Self {
            text: format!("{}\n\n{READ_MORE}", entry.title),
            summary: entry.summary,
            is_system: true,
            is_error: false,
            source_icon_url: entry.source_icon_url,
            source_name: entry.source_title,
            created_at: entry.published.unwrap_or(now),
            delivered_at: now,
            feed_link: entry.link,
            source_id,
        }
    }

    /// Diagnostic for a source whose poll failed.
    pub fn fetch_failed(source_id: usize, url: &str, now: DateTime<Utc>) -> Self {
        Self {
            text: format!("Failed to fetch feed. {url}"),
            summary: None,
            is_system: true,
            is_error: true,
            source_icon_url: DEFAULT_ICON_URL.into(),
            source_name: "Error".into(),
            created_at: now,
            delivered_at: now,
            feed_link: None,
            source_id,
        }
    }

    /// First line of the text, for single-line displays.
    pub fn headline(&self) -> &str {
        self.text.lines().next().unwrap_or_default()
    }
}

/// Where messages go once the aggregator is done with them.
pub trait EventSink: Send + Sync {
    fn emit(&self, message: Message);
}

impl EventSink for mpsc::UnboundedSender<Message> {
    fn emit(&self, message: Message) {
        // If the receiver is gone the UI has exited; drop silently.
        let _ = self.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ts;

    fn entry(published: Option<DateTime<Utc>>) -> Entry {
        Entry {
            title: "Headline".into(),
            summary: None,
            link: Some("https://example.com/a".into()),
            published,
            source_title: "Example".into(),
            source_icon_url: "https://example.com/i.png".into(),
        }
    }

    #[test]
    fn from_entry_carries_feed_identity_and_link() {
        let msg = Message::from_entry(entry(Some(ts(5))), 2, ts(60));

        assert_eq!(msg.text, "Headline\n\n[read more]");
        assert_eq!(msg.headline(), "Headline");
        assert!(msg.is_system);
        assert!(!msg.is_error);
        assert_eq!(msg.source_name, "Example");
        assert_eq!(msg.source_icon_url, "https://example.com/i.png");
        assert_eq!(msg.feed_link.as_deref(), Some("https://example.com/a"));
        assert_eq!(msg.created_at, ts(5));
        assert_eq!(msg.delivered_at, ts(60));
        assert_eq!(msg.source_id, 2);
    }

    #[test]
    fn undated_entry_is_created_at_delivery() {
        let msg = Message::from_entry(entry(None), 1, ts(60));
        assert_eq!(msg.created_at, ts(60));
    }

    #[test]
    fn fetch_failed_names_the_url() {
        let msg = Message::fetch_failed(3, "https://down.example.com/rss", ts(0));
        assert!(msg.is_system && msg.is_error);
        assert_eq!(msg.source_name, "Error");
        assert!(msg.text.contains("https://down.example.com/rss"));
        assert_eq!(msg.source_id, 3);
    }

    #[test]
    fn channel_sink_forwards_and_tolerates_closed_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.emit(Message::fetch_failed(1, "u", ts(0)));
        assert_eq!(rx.try_recv().unwrap().source_id, 1);

        drop(rx);
        tx.emit(Message::fetch_failed(1, "u", ts(0)));
    }
}
