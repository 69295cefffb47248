//! Request options and cache key derivation
//!
//! Options are validated and defaulted by [`QueryOptions::normalize`], which
//! returns a new value and never touches the input.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::{CACHE_KEY_PREFIX, DEFAULT_COUNTRY};
use crate::error::SerpError;

/// Device the results are requested for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Mobile,
    Desktop,
}

impl Device {
    /// Name used in cache keys, e.g. `mobile`
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Mobile => "mobile",
            Device::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the payload requested from the upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Parsed JSON, reshaped into a [`SerpResult`](super::SerpResult)
    #[default]
    Json,
    /// The raw results page
    Html,
}

impl OutputFormat {
    /// Name used in cache keys, e.g. `json`
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The data used for obtaining SERP results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Search term used for lookup. Required.
    pub keyword: String,
    /// Country to obtain results for. Defaults to [`DEFAULT_COUNTRY`].
    pub country: String,
    /// Mobile or desktop results
    pub device: Device,
    /// Query parameters sent upstream. Caller-supplied values win over
    /// the defaults filled in by [`QueryOptions::normalize`].
    pub params: BTreeMap<String, String>,
}

impl QueryOptions {
    /// Creates options for a keyword with every other field defaulted
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    /// Sets the country code sent as `gl`
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Sets the device; desktop always sends `lum_mobile=0`
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Adds an extra query parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Validates the options and returns a copy with defaults assigned
    ///
    /// # Returns
    /// * `Ok(QueryOptions)` with `q, gl, num, pws, lum_json, lum_mobile` set
    /// * `Err(SerpError::MissingKeyword)` if the keyword is empty
    pub fn normalize(&self) -> Result<QueryOptions, SerpError> {
        if self.keyword.is_empty() {
            return Err(SerpError::MissingKeyword);
        }

        let mut normalized = self.clone();
        if normalized.country.is_empty() {
            normalized.country = DEFAULT_COUNTRY.to_string();
        }

        let defaults = [
            ("q", normalized.keyword.clone()),
            ("gl", normalized.country.clone()),
            ("num", "100".to_string()),
            ("pws", "0".to_string()),
            ("lum_json", "1".to_string()),
            ("lum_mobile", "1".to_string()),
        ];
        for (key, value) in defaults {
            normalized.params.entry(key.to_string()).or_insert(value);
        }

        if normalized.device == Device::Desktop {
            normalized
                .params
                .insert("lum_mobile".to_string(), "0".to_string());
        }

        Ok(normalized)
    }

    /// Applies the per-format overrides to normalized options
    pub fn for_format(mut self, format: OutputFormat) -> Self {
        if format == OutputFormat::Html {
            self.params.insert("lum_json".to_string(), "0".to_string());
        }
        self
    }

    /// Builds the upstream request URL, parameters encoded in key order
    pub fn request_url(&self, base_url: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        format!("{}?{}", base_url, query)
    }

    /// Derives the cache key for these options
    pub fn cache_key(&self, format: OutputFormat, caching_enabled: bool) -> String {
        cache_key(
            &self.keyword,
            &self.country,
            self.device,
            format,
            caching_enabled,
        )
    }
}

/// Derives the key a response is stored under
///
/// Only the keyword, country, device and format take part, so changes to
/// auxiliary parameters still land on the same slot. Returns an empty
/// string when caching is disabled.
pub fn cache_key(
    keyword: &str,
    country: &str,
    device: Device,
    format: OutputFormat,
    caching_enabled: bool,
) -> String {
    if !caching_enabled {
        return String::new();
    }
    format!(
        "{}-{}-{}-{}-{}",
        CACHE_KEY_PREFIX, keyword, country, device, format
    )
}
