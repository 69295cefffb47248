//! Error types for the SERP retrieval pipeline
//!
//! Every failure the pipeline can produce is a [`SerpError`] variant. Callers
//! that only care about the category of a failure compare [`ErrorKind`]s
//! rather than matching individual variants.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::cache::CacheError;
use crate::client::FetchMeta;

/// Broad category of a [`SerpError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request options were invalid; nothing was sent
    Validation,
    /// A URL (proxy configuration or result link) could not be parsed
    Parse,
    /// The upstream request failed
    Transport,
    /// The upstream request hit its deadline or was cancelled
    ClientTimeout,
    /// The upstream body was not the JSON document we expected
    Decode,
    /// The cache backend failed
    Cache,
}

impl ErrorKind {
    /// Whether this kind is a transport failure, timeouts included
    pub fn is_transport(self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::ClientTimeout)
    }
}

/// Errors produced while building a client or retrieving SERP data
#[derive(Debug, Error)]
pub enum SerpError {
    /// No keyword was set on the query options
    #[error("no keyword provided to options")]
    MissingKeyword,

    /// The proxy URL was empty or malformed
    #[error("invalid proxy url: {0}")]
    ProxyUrl(String),

    /// The underlying HTTP client could not be built
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A result link could not be parsed as a URL
    #[error("error parsing result url '{link}': {source}")]
    Link {
        link: String,
        #[source]
        source: url::ParseError,
    },

    /// The request failed before a response was received
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The upstream answered with a non-success status
    #[error("upstream returned status {0}")]
    Status(StatusCode),

    /// The deadline passed or the caller cancelled before the response arrived
    #[error("deadline exceeded (client timeout exceeded while awaiting response)")]
    ClientTimeout,

    /// The response body was not valid JSON for a SERP document
    #[error("error unmarshalling response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response body was valid JSON but not an object
    #[error("error unmarshalling response: expected a JSON object")]
    NotAnObject,

    /// The cache backend failed
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl SerpError {
    /// Returns the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SerpError::MissingKeyword => ErrorKind::Validation,
            SerpError::ProxyUrl(_) | SerpError::Link { .. } => ErrorKind::Parse,
            SerpError::HttpClient(_) | SerpError::Transport(_) | SerpError::Status(_) => {
                ErrorKind::Transport
            }
            SerpError::ClientTimeout => ErrorKind::ClientTimeout,
            SerpError::Decode(_) | SerpError::NotAnObject => ErrorKind::Decode,
            SerpError::Cache(_) => ErrorKind::Cache,
        }
    }

    /// Maps a reqwest failure, splitting deadline errors out from the rest
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SerpError::ClientTimeout
        } else {
            SerpError::Transport(err)
        }
    }
}

/// A failed fetch together with whatever metadata the request had gathered
///
/// The metadata is always finalized. The cache key and request URL are only
/// populated when the failure happened after the options were validated.
#[derive(Debug)]
pub struct FetchError {
    /// What went wrong
    pub source: SerpError,
    /// Request metadata at the point of failure
    pub meta: FetchMeta,
}

impl FetchError {
    /// Returns the category of the underlying error
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if !self.meta.request_url.is_empty() {
            write!(f, " (url: {}", self.meta.request_url)?;
            if !self.meta.cache_key.is_empty() {
                write!(f, ", cache key: {}", self.meta.cache_key)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
