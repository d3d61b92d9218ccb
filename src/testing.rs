//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::{mpsc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::error::FetchError;
use crate::message::{EventSink, Message};
use crate::source::{FeedMeta, FeedParser, ParsedFeed, RawEntry};

/// A fixed instant `secs` seconds after an arbitrary epoch.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// A feed titled "Feed" whose entries are `(title, published offset)` pairs
/// in document order.
pub fn feed(entries: &[(&str, Option<i64>)]) -> ParsedFeed {
    feed_titled("Feed", entries)
}

pub fn feed_titled(title: &str, entries: &[(&str, Option<i64>)]) -> ParsedFeed {
    ParsedFeed {
        meta: FeedMeta {
            title: title.into(),
            icon_url: None,
        },
        entries: entries
            .iter()
            .map(|(title, published)| RawEntry {
                title: Some(title.to_string()),
                summary: None,
                link: Some(format!("https://example.com/{title}")),
                published: published.map(ts),
            })
            .collect(),
    }
}

enum Response {
    Feed(ParsedFeed),
    Fail,
}

/// A [`FeedParser`] that answers from a per-URL script.
///
/// Unknown URLs fail with a parse error.
#[derive(Default)]
pub struct ScriptedParser {
    responses: Mutex<HashMap<String, Response>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_feed(&self, url: &str, feed: ParsedFeed) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Response::Feed(feed));
    }

    pub fn fail(&self, url: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Response::Fail);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl FeedParser for ScriptedParser {
    fn parse(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        match self.responses.lock().unwrap().get(url) {
            Some(Response::Feed(feed)) => Ok(feed.clone()),
            Some(Response::Fail) => Err(FetchError::Status(503)),
            None => Err(FetchError::Parse(format!("no script for {url}"))),
        }
    }
}

/// Wraps a [`ScriptedParser`] so that every fetch announces itself and then
/// blocks until the test releases it.
///
/// Dropping the release sender lets all pending and future fetches through.
pub struct GatedParser {
    inner: ScriptedParser,
    started: Mutex<mpsc::Sender<String>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedParser {
    /// Returns the parser, a receiver of fetched URLs as each fetch starts,
    /// and the sender that releases one fetch per message.
    pub fn new(inner: ScriptedParser) -> (Self, mpsc::Receiver<String>, mpsc::Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let parser = Self {
            inner,
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        (parser, started_rx, release_tx)
    }

    pub fn calls(&self, url: &str) -> usize {
        self.inner.calls(url)
    }
}

impl FeedParser for GatedParser {
    fn parse(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let _ = self.started.lock().unwrap().send(url.to_string());
        let _ = self.release.lock().unwrap().recv();
        self.inner.parse(url)
    }
}

/// An [`EventSink`] that records everything emitted.
#[derive(Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<Message>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }
}
