//! Client configuration and defaults

use std::time::Duration;

/// Time limit for requests made by the client
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of idle (keep-alive) connections kept per host
pub const IDLE_CONNECTIONS: usize = 50;

/// Country used when the options don't name one
pub const DEFAULT_COUNTRY: &str = "uk";

/// How long a response lives in the cache
pub const DEFAULT_CACHE_EXPIRY: Duration = Duration::from_secs(8 * 60 * 60);

/// Prepended to every cache key
pub const CACHE_KEY_PREFIX: &str = "luminati-client";

/// Search endpoint requested through the proxy
pub const DEFAULT_BASE_URL: &str = "http://www.google.com/search";

/// Environment variable holding the proxy URL for the binary
pub const PROXY_ENV: &str = "LUMINATI_URL";

/// Settings used to build a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Proxy every request is routed through. Must be a valid URL.
    pub proxy_url: String,
    /// Search endpoint the proxy is asked to fetch
    pub base_url: String,
    /// Lifetime of cache entries written by the client
    pub cache_expiry: Duration,
    /// Overall deadline for a single upstream request
    pub timeout: Duration,
    /// Idle connection pool size
    pub max_idle_connections: usize,
}

impl ClientConfig {
    /// Creates a config for the given proxy with every other field defaulted
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            proxy_url: proxy_url.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_expiry: DEFAULT_CACHE_EXPIRY,
            timeout: HTTP_TIMEOUT,
            max_idle_connections: IDLE_CONNECTIONS,
        }
    }

    /// Overrides the cache expiry
    pub fn with_cache_expiry(mut self, expiry: Duration) -> Self {
        self.cache_expiry = expiry;
        self
    }

    /// Overrides the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the search endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
