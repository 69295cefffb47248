//! Upstream JSON decoding
//!
//! The upstream document is large and loosely typed. Only the organic list
//! is decoded field by field; every other non-reserved top-level section is
//! recorded as a SERP feature and kept as raw JSON text.

use serde::Deserialize;
use serde_json::Value;

use super::link::normalize_link;
use super::{OrganicResult, SerpResult};
use crate::error::SerpError;

/// Top-level sections that are never reported as features
const RESERVED_SECTIONS: [&str; 4] = ["general", "organic", "pagination", "related"];

/// A single entry of the upstream `organic` array
///
/// Fields are optional so that a missing or `null` value reads as empty
/// instead of failing the whole page.
#[derive(Debug, Deserialize)]
struct ResponseOrganic {
    #[serde(default)]
    rank: Option<i64>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Reshapes an upstream JSON body into a [`SerpResult`]
///
/// # Returns
/// * `Ok(SerpResult)` with cleaned organic results and detected features
/// * `Err(SerpError)` if the body isn't a JSON object or `organic` isn't a
///   list of result objects
///
/// Organic entries whose link can't be parsed are dropped; one bad link
/// doesn't fail the page.
pub fn decode(body: &[u8]) -> Result<SerpResult, SerpError> {
    let Value::Object(document) = serde_json::from_slice::<Value>(body)? else {
        return Err(SerpError::NotAnObject);
    };

    let mut result = SerpResult::default();

    for (name, section) in &document {
        if RESERVED_SECTIONS.contains(&name.as_str()) {
            continue;
        }
        result.features.push(name.clone());
        result
            .feature_bodies
            .insert(name.clone(), section.to_string());
    }

    let entries = match document.get("organic") {
        Some(organic) => Option::<Vec<ResponseOrganic>>::deserialize(organic)?.unwrap_or_default(),
        None => Vec::new(),
    };

    for entry in entries {
        let rank = entry.rank.unwrap_or_default();
        let link = match normalize_link(entry.link.as_deref().unwrap_or_default()) {
            Ok(link) => link,
            Err(err) => {
                tracing::debug!(rank, error = %err, "dropping organic result");
                continue;
            }
        };
        result.organic.push(OrganicResult {
            rank,
            link,
            description: entry.description.unwrap_or_default(),
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn decode_value(value: Value) -> Result<SerpResult, SerpError> {
        let body = serde_json::to_vec(&value).expect("Failed to encode test document");
        decode(&body)
    }

    #[test]
    fn test_invalid_json_is_a_decode_error() {
        let err = decode(b"<html>not json</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("error unmarshalling response"));
    }

    #[test]
    fn test_non_object_is_a_decode_error() {
        let err = decode(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, SerpError::NotAnObject));
    }

    #[test]
    fn test_features_only() {
        let result = decode_value(json!({"images": 1})).unwrap();

        assert!(result.organic.is_empty());
        assert_eq!(result.features, vec!["images"]);
        assert_eq!(result.feature_bodies["images"], "1");
    }

    #[test]
    fn test_reserved_sections_are_not_features() {
        let result = decode_value(json!({
            "images": 1,
            "general": {"query": "reddico"},
            "pagination": {"current_page": 1},
            "related": [],
            "organic": []
        }))
        .unwrap();

        assert_eq!(result.features, vec!["images"]);
        assert_eq!(result.feature_bodies.len(), 1);
    }

    #[test]
    fn test_organic_link_is_cleaned() {
        let result = decode_value(json!({
            "organic": [{"rank": 1, "link": "https://example.com?x=1#y", "description": "d"}]
        }))
        .unwrap();

        assert_eq!(
            result.organic,
            vec![OrganicResult {
                rank: 1,
                link: "https://example.com".to_string(),
                description: "d".to_string(),
            }]
        );
        assert!(result.features.is_empty());
    }

    #[test]
    fn test_organic_with_bad_link_is_dropped() {
        let result = decode_value(json!({
            "organic": [
                {"rank": 1, "link": "postgres://user:abc{", "description": "SEO"},
                {"rank": 2, "link": "https://reddico.co.uk", "description": "SEO"}
            ]
        }))
        .unwrap();

        assert_eq!(result.organic.len(), 1);
        assert_eq!(result.organic[0].rank, 2);
    }

    #[test]
    fn test_organic_extra_fields_are_ignored() {
        let result = decode_value(json!({
            "organic": [{
                "rank": 4,
                "global_rank": 7,
                "link": "https://reddico.co.uk/",
                "display_link": "reddico.co.uk",
                "title": "Reddico",
                "description": "SEO agency",
                "extensions": [{"type": "site_link", "text": "Contact", "inline": true}]
            }]
        }))
        .unwrap();

        assert_eq!(result.organic[0].rank, 4);
        assert_eq!(result.organic[0].link, "https://reddico.co.uk/");
        assert_eq!(result.organic[0].description, "SEO agency");
    }

    #[test]
    fn test_null_fields_do_not_fail_the_page() {
        let result = decode_value(json!({
            "organic": [
                {"rank": 1, "link": null, "description": "no link"},
                {"rank": 2, "link": "https://b.example/?q=1", "description": null},
                {"rank": null, "link": "https://c.example", "description": "no rank"}
            ]
        }))
        .unwrap();

        assert_eq!(result.organic.len(), 3);
        assert_eq!(result.organic[0].link, "");
        assert_eq!(result.organic[1].link, "https://b.example/");
        assert_eq!(result.organic[1].description, "");
        assert_eq!(result.organic[2].rank, 0);
    }

    #[test]
    fn test_relative_link_is_kept() {
        let result = decode_value(json!({
            "organic": [{"rank": 1, "link": "/search?q=x", "description": "related search"}]
        }))
        .unwrap();

        assert_eq!(result.organic.len(), 1);
        assert_eq!(result.organic[0].link, "/search");
    }

    #[test]
    fn test_null_organic_is_empty() {
        let result = decode_value(json!({"organic": null})).unwrap();
        assert!(result.organic.is_empty());
    }

    #[test]
    fn test_malformed_organic_is_a_decode_error() {
        let err = decode_value(json!({"organic": "nope"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_counts_match_synthetic_document() {
        let organic: Vec<Value> = (1..=8)
            .map(|rank| {
                let link = if rank == 5 {
                    "postgres://user:abc{".to_string()
                } else {
                    format!("https://site{}.example/page?utm=1", rank)
                };
                json!({"rank": rank, "link": link, "description": format!("result {}", rank)})
            })
            .collect();

        let result = decode_value(json!({
            "general": {},
            "organic": organic,
            "images": [],
            "people_also_ask": [],
            "knowledge": {},
        }))
        .unwrap();

        assert_eq!(result.organic.len(), 7);
        assert_eq!(result.features.len(), 3);
        assert!(result.organic.iter().all(|o| !o.link.contains('?')));
    }
}
