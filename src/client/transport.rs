//! Upstream transport
//!
//! [`ProxyTransport`] routes every request through the configured Luminati
//! proxy. The [`Upstream`] trait lets tests and callers swap it out.

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use url::Url;

use crate::config::{ClientConfig, PROXY_ENV};
use crate::error::SerpError;

/// Performs the single GET a fetch is allowed to make
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetches `url` and returns the full response body
    async fn get(&self, url: &str) -> Result<Vec<u8>, SerpError>;
}

/// HTTP client that sends every request through the proxy
#[derive(Debug, Clone)]
pub struct ProxyTransport {
    http_client: Client,
}

impl ProxyTransport {
    /// Builds the proxied HTTP client
    ///
    /// # Returns
    /// * `Err(SerpError::ProxyUrl)` if the proxy URL is empty or malformed
    /// * `Err(SerpError::HttpClient)` if the client can't be built
    pub fn new(config: &ClientConfig) -> Result<Self, SerpError> {
        if config.proxy_url.is_empty() {
            return Err(SerpError::ProxyUrl(format!(
                "proxy url cannot be empty, export {}",
                PROXY_ENV
            )));
        }
        // The proxy URL embeds credentials, so only the parse error is reported.
        Url::parse(&config.proxy_url).map_err(|e| SerpError::ProxyUrl(e.to_string()))?;

        let proxy = Proxy::all(config.proxy_url.as_str()).map_err(SerpError::HttpClient)?;
        let http_client = Client::builder()
            .proxy(proxy)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.timeout)
            .build()
            .map_err(SerpError::HttpClient)?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Upstream for ProxyTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, SerpError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(SerpError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SerpError::Status(status));
        }

        let body = response.bytes().await.map_err(SerpError::from_reqwest)?;
        Ok(body.to_vec())
    }
}
