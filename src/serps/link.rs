//! Result link cleanup

use url::{ParseError, Url};

use crate::error::SerpError;

/// Base used only to check that relative links are well formed
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Removes the query string and fragment from a result link
///
/// Absolute URLs and relative references (`/search?q=x`) are both accepted.
/// Everything before the first `?` or `#` is returned as given, so cleaning
/// an already clean link is a no-op.
pub fn normalize_link(raw: &str) -> Result<String, SerpError> {
    let raw = raw.trim();
    let parsed = match Url::parse(raw) {
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).and_then(|base| base.join(raw))
        }
        other => other,
    };
    parsed.map_err(|source| SerpError::Link {
        link: raw.to_string(),
        source,
    })?;

    let end = raw.find(|c: char| c == '?' || c == '#').unwrap_or(raw.len());
    Ok(raw[..end].to_string())
}
