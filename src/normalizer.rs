//! URL normalization and deduplication.
//!
//! Inventory spreadsheets carry bare hostnames, stray slashes, and mixed
//! casing. Everything is coerced to a schemed, canonical form before any
//! navigation happens, so retries and the report always refer to the same
//! string.

use std::collections::HashSet;

use url::Url;

use crate::error::CheckError;

/// Normalize a raw inventory entry into a navigable URL.
///
/// Trims whitespace and stray leading/trailing slashes, prefixes `https://`
/// when no scheme is present, then canonicalizes through [`Url`] (lowercased
/// host, normalized path). Strings that still fail to parse are returned
/// verbatim after prefixing; navigation will surface the failure.
pub fn normalize_url(raw: &str) -> Result<String, CheckError> {
    let trimmed = raw.trim().trim_matches('/').trim();
    if trimmed.is_empty() {
        return Err(CheckError::EmptyInput);
    }

    let schemed = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    match Url::parse(&schemed) {
        Ok(parsed) => Ok(parsed.to_string()),
        Err(_) => Ok(schemed),
    }
}

/// Order-preserving first-seen dedup over normalized URLs.
#[must_use]
pub fn dedup_urls<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for url in urls {
        if seen.insert(url.clone()) {
            unique.push(url);
        }
    }
    unique
}
