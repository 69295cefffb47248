//! SERP data models
//!
//! This module contains the request options sent upstream and the compact,
//! cacheable result model the upstream JSON document is reshaped into.

pub mod domain;
pub mod link;
pub mod options;
pub mod response;

pub use domain::{DomainMatch, RankedMatch};
pub use link::normalize_link;
pub use options::{cache_key, Device, OutputFormat, QueryOptions};
pub use response::decode;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single organic (non-feature) search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganicResult {
    /// Position on the results page, 1 being the top
    #[serde(rename = "position")]
    pub rank: i64,
    /// Result link with the query string and fragment removed
    #[serde(rename = "url")]
    pub link: String,
    /// Snippet shown under the link
    #[serde(rename = "text")]
    pub description: String,
}

/// The reshaped SERP for one keyword
///
/// This is what the JSON retrieval path caches, so everything needed by
/// [`SerpResult::check_url`] has to survive serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpResult {
    /// Organic results in the order the upstream returned them
    #[serde(rename = "serps", default)]
    pub organic: Vec<OrganicResult>,
    /// Names of the non-organic sections present on the page
    #[serde(default)]
    pub features: Vec<String>,
    /// Raw JSON text of each feature section, keyed by feature name
    #[serde(default)]
    pub feature_bodies: BTreeMap<String, String>,
}

impl SerpResult {
    /// Whether the page had no organic results
    pub fn is_empty(&self) -> bool {
        self.organic.is_empty()
    }
}
