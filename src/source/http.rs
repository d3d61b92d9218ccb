//! HTTP feed parser for RSS 2.0 and Atom.
//!
//! [`HttpFeedParser`] is the production [`FeedParser`]: it downloads the feed
//! with a bounded timeout and parses the body as RSS, falling back to Atom.
//! The conversion functions are pure (no I/O) so that tests can exercise the
//! parsing logic without hitting the network.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{FeedMeta, FeedParser, ParsedFeed, RawEntry};
use crate::error::FetchError;

/// Fetches feeds over HTTP with a blocking [`reqwest`] client.
///
/// Must be called off the async runtime (the poll coordinator runs each
/// cycle on a blocking thread).
pub struct HttpFeedParser {
    client: reqwest::blocking::Client,
}

impl HttpFeedParser {
    /// Create a parser whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl FeedParser for HttpFeedParser {
    fn parse(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().map_err(classify)?;
        parse_document(&body)
    }
}

/// Surface timeouts as their own variant so diagnostics can tell them apart.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(err)
    }
}

/// Parse a feed document, trying RSS first and Atom second.
pub fn parse_document(body: &[u8]) -> Result<ParsedFeed, FetchError> {
    match rss::Channel::read_from(body) {
        Ok(channel) => Ok(parse_channel(&channel)),
        Err(rss_err) => match atom_syndication::Feed::read_from(body) {
            Ok(feed) => Ok(parse_atom(&feed)),
            Err(atom_err) => Err(FetchError::Parse(format!(
                "not RSS ({rss_err}) and not Atom ({atom_err})"
            ))),
        },
    }
}

/// Convert an already-parsed [`rss::Channel`].
pub fn parse_channel(channel: &rss::Channel) -> ParsedFeed {
    let meta = FeedMeta {
        title: channel.title().to_string(),
        icon_url: channel.image().map(|img| img.url().to_string()),
    };

    let entries = channel
        .items()
        .iter()
        .map(|item| RawEntry {
            title: item.title().map(String::from),
            summary: item.description().map(String::from),
            link: item.link().map(String::from),
            // Parse RFC-2822 date; gracefully degrade to None on failure.
            published: item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
        .collect();

    ParsedFeed { meta, entries }
}

/// Convert an already-parsed Atom feed.
pub fn parse_atom(feed: &atom_syndication::Feed) -> ParsedFeed {
    let meta = FeedMeta {
        title: feed.title().value.clone(),
        icon_url: feed.icon().or(feed.logo()).map(String::from),
    };

    let entries = feed
        .entries()
        .iter()
        .map(|entry| {
            // Prefer the alternate link, otherwise whatever comes first.
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string());

            let summary = entry
                .summary()
                .map(|s| s.value.clone())
                .or_else(|| entry.content().and_then(|c| c.value()).map(String::from));

            let published = entry.published().unwrap_or(entry.updated());

            RawEntry {
                title: Some(entry.title().value.clone()),
                summary,
                link,
                published: Some(published.with_timezone(&Utc)),
            }
        })
        .collect();

    ParsedFeed { meta, entries }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_channel_extracts_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <description>d</description>
    <image>
      <url>https://example.com/logo.png</url>
      <title>Test Feed</title>
      <link>https://example.com</link>
    </image>
    <item>
      <title>Second Post</title>
      <link>https://example.com/2</link>
      <pubDate>Tue, 02 Jan 2024 12:00:00 +0000</pubDate>
      <description>Second description</description>
    </item>
    <item>
      <title>First Post</title>
      <link>https://example.com/1</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

        let feed = parse_document(xml.as_bytes()).unwrap();

        assert_eq!(feed.meta.title, "Test Feed");
        assert_eq!(feed.meta.icon_url.as_deref(), Some("https://example.com/logo.png"));
        assert_eq!(feed.entries.len(), 2);

        assert_eq!(feed.entries[0].title.as_deref(), Some("Second Post"));
        assert_eq!(feed.entries[0].link.as_deref(), Some("https://example.com/2"));
        assert_eq!(feed.entries[0].summary.as_deref(), Some("Second description"));
        assert_eq!(
            feed.entries[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap())
        );

        assert_eq!(feed.entries[1].title.as_deref(), Some("First Post"));
        assert!(feed.entries[1].summary.is_none());
    }

    #[test]
    fn handles_invalid_date() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item>
      <title>Bad Date</title>
      <pubDate>not-a-real-date</pubDate>
    </item>
  </channel>
</rss>"#;

        let feed = parse_document(xml.as_bytes()).unwrap();
        assert!(feed.entries[0].published.is_none());
        assert!(feed.meta.icon_url.is_none());
    }

    #[test]
    fn falls_back_to_atom() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <id>urn:uuid:feed</id>
  <updated>2024-03-01T00:00:00Z</updated>
  <icon>https://example.com/favicon.ico</icon>
  <entry>
    <title>Atom Entry</title>
    <id>urn:uuid:1</id>
    <link rel="alternate" href="https://example.com/atom/1"/>
    <updated>2024-03-01T10:00:00Z</updated>
    <published>2024-02-29T08:00:00Z</published>
    <summary>Atom summary</summary>
  </entry>
  <entry>
    <title>Only Updated</title>
    <id>urn:uuid:2</id>
    <updated>2024-02-28T00:00:00Z</updated>
  </entry>
</feed>"#;

        let feed = parse_document(xml.as_bytes()).unwrap();

        assert_eq!(feed.meta.title, "Atom Feed");
        assert_eq!(feed.meta.icon_url.as_deref(), Some("https://example.com/favicon.ico"));
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.title.as_deref(), Some("Atom Entry"));
        assert_eq!(first.link.as_deref(), Some("https://example.com/atom/1"));
        assert_eq!(first.summary.as_deref(), Some("Atom summary"));
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap()),
            "published wins over updated"
        );

        assert_eq!(
            feed.entries[1].published,
            Some(Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap())
        );
        assert!(feed.entries[1].link.is_none());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_document(b"<html><body>nope</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
