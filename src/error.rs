//! Error types for feed fetching and polling.

use thiserror::Error;

/// Why a single source failed to poll.
///
/// Failures are isolated per source: the poll coordinator turns each one
/// into a diagnostic message and carries on with the remaining sources.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP response with a non-2xx status code.
    #[error("HTTP error: status {0}")]
    Status(u16),

    /// The request did not complete within the configured fetch timeout.
    #[error("request timed out")]
    Timeout,

    /// The body was neither valid RSS nor valid Atom.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A failed poll, naming the URL that was actually fetched.
///
/// The configuration may change while a fetch is in flight, so the URL is
/// captured at fetch time rather than re-read afterwards.
#[derive(Debug, Error)]
#[error("{url}: {error}")]
pub struct PollError {
    pub url: String,
    #[source]
    pub error: FetchError,
}
