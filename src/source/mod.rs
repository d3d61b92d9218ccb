//! Feed sources and the parser they poll through.
//!
//! This module defines the [`FeedParser`] trait, the entry types a parse
//! produces, and [`FeedSource`], which owns one configured feed slot: its
//! pending-entry queue and its dedup watermark.
//!
//! ## For contributors — adding a new feed format
//!
//! 1. Teach [`http::parse_document`] to recognise the format, or write a new
//!    [`FeedParser`] implementation in its own file in this directory.
//! 2. Convert the format's items into [`RawEntry`] values in document order.
//! 3. Re-export the parser below and construct it in `main.rs`.
//!
//! Dedup, queueing and fair draining are all format-agnostic.

mod entry;
mod feed_source;
mod http;

// Re-export the public API of this module so callers can write
// `use crate::source::{FeedParser, FeedSource, HttpFeedParser};`
pub use entry::{Entry, FeedMeta, ParsedFeed, RawEntry, DEFAULT_ICON_URL};
pub use feed_source::{FeedSource, PollOutcome};
pub use http::HttpFeedParser;

use crate::error::FetchError;

/// Anything that can turn a feed URL into a [`ParsedFeed`].
///
/// The poll coordinator calls [`parse()`](FeedParser::parse) on a blocking
/// worker thread, once per configured source per cycle, so implementations
/// may do synchronous I/O but must be [`Send`] + [`Sync`].  They are also
/// responsible for bounding how long one call may take; a timeout is
/// reported as [`FetchError::Timeout`].
pub trait FeedParser: Send + Sync {
    /// Fetch and parse the feed at `url`.
    fn parse(&self, url: &str) -> Result<ParsedFeed, FetchError>;
}
