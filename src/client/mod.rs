//! Cache-aside client for the Luminati SERP API
//!
//! Each fetch normalizes the options, derives a cache key, and serves the
//! payload from the cache when it can. On a miss it makes exactly one
//! upstream request. The JSON path caches the reshaped [`SerpResult`], so a
//! hit skips decoding as well as the network. The HTML path caches the raw
//! page.
//!
//! Cache failures never fail a fetch: read errors fall through to the
//! upstream and write errors are logged.

mod meta;
mod transport;

pub use meta::FetchMeta;
pub use transport::{ProxyTransport, Upstream};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::ClientConfig;
use crate::error::{FetchError, SerpError};
use crate::serps::{decode, OutputFormat, QueryOptions, SerpResult};

/// A payload and the metadata of the fetch that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Fetched<T> {
    pub payload: T,
    pub meta: FetchMeta,
}

/// Client for obtaining SERP data through the Luminati proxy
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct Client {
    upstream: Arc<dyn Upstream>,
    cache: Option<Arc<dyn CacheStore>>,
    base_url: String,
    cache_expiry: Duration,
    timeout: Duration,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("has_cache", &self.has_cache())
            .field("cache_expiry", &self.cache_expiry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Client {
    /// Creates a client without a cache
    ///
    /// Fails if the proxy URL is empty or can't be parsed.
    pub fn new(config: ClientConfig) -> Result<Self, SerpError> {
        let transport = ProxyTransport::new(&config)?;
        Ok(Self::with_upstream(config, Arc::new(transport)))
    }

    /// Creates a client with a custom upstream transport
    pub fn with_upstream(config: ClientConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            cache: None,
            base_url: config.base_url,
            cache_expiry: config.cache_expiry,
            timeout: config.timeout,
        }
    }

    /// Attaches a cache store, enabling cache-aside lookups
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Retrieves the SERP as JSON and reshapes it
    ///
    /// # Returns
    /// * `Ok(Fetched<SerpResult>)` on success
    /// * `Err(FetchError)` if the options are invalid, the request fails or
    ///   times out, or the body can't be decoded
    pub async fn json(
        &self,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<Fetched<SerpResult>, FetchError> {
        let mut meta = FetchMeta::started();
        let result = self.fetch_json(options, cancel, &mut meta).await;
        meta.finish();
        match result {
            Ok(payload) => Ok(Fetched { payload, meta }),
            Err(source) => Err(FetchError { source, meta }),
        }
    }

    /// Retrieves the raw SERP HTML
    ///
    /// A page that isn't valid UTF-8 is returned with invalid sequences
    /// replaced, but cached byte for byte as the upstream sent it.
    ///
    /// # Returns
    /// * `Ok(Fetched<String>)` on success
    /// * `Err(FetchError)` if the options are invalid or the request fails
    ///   or times out
    pub async fn html(
        &self,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<Fetched<String>, FetchError> {
        let mut meta = FetchMeta::started();
        let result = self.fetch_html(options, cancel, &mut meta).await;
        meta.finish();
        match result {
            Ok(payload) => Ok(Fetched { payload, meta }),
            Err(source) => Err(FetchError { source, meta }),
        }
    }

    async fn fetch_json(
        &self,
        options: &QueryOptions,
        cancel: &CancellationToken,
        meta: &mut FetchMeta,
    ) -> Result<SerpResult, SerpError> {
        self.prepare(options, OutputFormat::Json, meta)?;

        if let Some(cached) = self.cache_get(&meta.cache_key).await {
            match serde_json::from_slice::<SerpResult>(&cached) {
                Ok(serps) => {
                    meta.was_cached = true;
                    return Ok(serps);
                }
                Err(err) => {
                    warn!(key = %meta.cache_key, error = %err, "discarding undecodable cache entry");
                }
            }
        }

        let body = self.fetch_upstream(&meta.request_url, cancel).await?;
        meta.raw_body = String::from_utf8_lossy(&body).into_owned();
        let serps = decode(&body)?;

        if serps.is_empty() {
            debug!(key = %meta.cache_key, "no organic results, skipping cache write");
        } else {
            match serde_json::to_vec(&serps) {
                Ok(bytes) => self.cache_set(&meta.cache_key, bytes).await,
                Err(err) => warn!(key = %meta.cache_key, error = %err, "failed to encode result for cache"),
            }
        }

        Ok(serps)
    }

    async fn fetch_html(
        &self,
        options: &QueryOptions,
        cancel: &CancellationToken,
        meta: &mut FetchMeta,
    ) -> Result<String, SerpError> {
        self.prepare(options, OutputFormat::Html, meta)?;

        if let Some(cached) = self.cache_get(&meta.cache_key).await {
            meta.was_cached = true;
            return Ok(String::from_utf8_lossy(&cached).into_owned());
        }

        let body = self.fetch_upstream(&meta.request_url, cancel).await?;
        let html = String::from_utf8_lossy(&body).into_owned();
        meta.raw_body = html.clone();
        self.cache_set(&meta.cache_key, body).await;

        Ok(html)
    }

    /// Validates the options and records the cache key and request URL
    fn prepare(
        &self,
        options: &QueryOptions,
        format: OutputFormat,
        meta: &mut FetchMeta,
    ) -> Result<(), SerpError> {
        let options = options.normalize()?.for_format(format);
        meta.cache_key = options.cache_key(format, self.has_cache());
        meta.request_url = options.request_url(&self.base_url);
        Ok(())
    }

    /// Reads from the cache, treating any failure as a miss
    async fn cache_get(&self, key: &str) -> Option<Vec<u8>> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(value)) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(err) => {
                warn!(key, error = %err, "cache read failed, fetching from upstream");
                None
            }
        }
    }

    /// Writes to the cache; failures are logged and otherwise ignored
    async fn cache_set(&self, key: &str, value: Vec<u8>) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(err) = cache.set(key, value, self.cache_expiry).await {
            warn!(key, error = %err, "cache write failed");
        }
    }

    /// Makes the single upstream request, bounded by the timeout and `cancel`
    async fn fetch_upstream(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, SerpError> {
        debug!(url, "requesting upstream");
        let started = Instant::now();

        let request = tokio::time::timeout(self.timeout, self.upstream.get(url));
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url, "request cancelled");
                return Err(SerpError::ClientTimeout);
            }
            result = request => result.map_err(|_| SerpError::ClientTimeout)??,
        };

        info!(
            url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );
        Ok(body)
    }
}
