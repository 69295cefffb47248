//! URL-specific queries against a reshaped SERP

use serde::{Deserialize, Serialize};

use super::{OrganicResult, SerpResult};

/// The best ranking result for a URL and the features it appears in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMatch {
    #[serde(rename = "position")]
    pub rank: i64,
    #[serde(rename = "url")]
    pub link: String,
    #[serde(rename = "text")]
    pub description: String,
    /// Comma delimited feature names whose content mentions the URL
    pub features: String,
}

/// Every organic result matching a URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMatch {
    /// Highest ranking match, if any
    #[serde(rename = "query")]
    pub best: Option<RankedMatch>,
    /// All matches in rank order
    #[serde(rename = "results")]
    pub results: Vec<OrganicResult>,
}

impl DomainMatch {
    pub fn is_match(&self) -> bool {
        self.best.is_some()
    }
}

impl SerpResult {
    /// Finds the results ranking for `target`
    ///
    /// A result matches when its link contains `target` anywhere, so short
    /// targets can match more than the caller intended. Results are assumed
    /// to be in rank order; the first match becomes the best match.
    pub fn check_url(&self, target: &str) -> DomainMatch {
        let mut domain = DomainMatch::default();

        for organic in self.organic.iter().filter(|o| o.link.contains(target)) {
            if domain.best.is_none() {
                domain.best = Some(RankedMatch {
                    rank: organic.rank,
                    link: organic.link.clone(),
                    description: organic.description.clone(),
                    features: self.features_for(target),
                });
            }
            domain.results.push(organic.clone());
        }

        domain
    }

    /// Comma delimited list of the features mentioning `target`
    fn features_for(&self, target: &str) -> String {
        self.features
            .iter()
            .filter(|name| {
                self.feature_bodies
                    .get(name.as_str())
                    .is_some_and(|body| body.contains(target))
            })
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}
