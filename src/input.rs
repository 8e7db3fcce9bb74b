//! CSV inventory reader.
//!
//! Accepts any spreadsheet export with a `Domain`/`URL` column (case
//! insensitive); the first matching non-empty cell per row is the raw URL.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{CheckError, TriageResult};

const URL_COLUMN_NAMES: &[&str] = &["domain", "url"];

/// Read raw URL strings from the inventory CSV, in row order.
///
/// Rows without a value in the URL column are skipped. A file with no
/// recognizable column yields no URLs; the caller treats an empty batch as
/// a startup failure.
pub fn read_raw_urls(path: &Path) -> TriageResult<Vec<String>> {
    if !path.exists() {
        return Err(CheckError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", path.display()),
        )));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut index = HashMap::<String, usize>::new();
    for (idx, header) in headers.iter().enumerate() {
        index.insert(header.trim().to_ascii_lowercase(), idx);
    }

    let url_columns: Vec<usize> = URL_COLUMN_NAMES
        .iter()
        .filter_map(|name| index.get(*name).copied())
        .collect();

    if url_columns.is_empty() {
        debug!(
            headers = ?headers.iter().collect::<Vec<_>>(),
            "no Domain/URL column in input"
        );
        return Ok(Vec::new());
    }

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = url_columns
            .iter()
            .filter_map(|idx| record.get(*idx))
            .map(str::trim)
            .find(|value| !value.is_empty());
        if let Some(raw) = cell {
            urls.push(raw.to_string());
        }
    }

    debug!(count = urls.len(), "read raw URLs from input");
    Ok(urls)
}
