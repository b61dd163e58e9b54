//! Error type definitions.
//!
//! This module defines the errors surfaced by the audit engine. Only input
//! validation and the page fetch are terminal failures; everything further
//! down the pipeline degrades gracefully instead of erroring (see the module
//! docs on `scripts` and `js_parsing`).

use thiserror::Error;

/// Machine-readable code for the missing-input error.
pub const URL_OR_HTML_REQUIRED: &str = "URL_OR_HTML_REQUIRED";

/// Errors that abort an audit.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Neither a URL nor an HTML document was provided.
    #[error("either a URL or an HTML document is required (URL_OR_HTML_REQUIRED)")]
    UrlOrHtmlRequired,

    /// The given URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as supplied by the caller.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The page responded with a non-success status.
    #[error(
        "failed to fetch {url}: HTTP {status}; if the site blocks automated \
         requests, submit the page HTML manually instead"
    )]
    PageFetchStatus {
        /// The URL that was fetched.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },

    /// The page fetch exceeded its deadline.
    #[error(
        "timed out fetching {url} after {seconds}s; if the site is slow or \
         blocks automated requests, submit the page HTML manually instead"
    )]
    PageFetchTimeout {
        /// The URL that was fetched.
        url: String,
        /// The timeout that elapsed, in seconds.
        seconds: u64,
    },

    /// DNS/connection/transport failure fetching the page.
    #[error(
        "failed to fetch {url}: {source}; if the site is unreachable from \
         this network, submit the page HTML manually instead"
    )]
    PageFetchFailed {
        /// The URL that was fetched.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}
