//! Final classification statuses for a checked URL.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a completed check. Every URL settles on exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Server-side failure (HTTP 500-599) or navigation that never succeeded
    #[serde(rename = "5xx")]
    ServerError5xx,
    /// HTTP 404 from the server
    #[serde(rename = "404")]
    NotFound,
    /// Domain-parking or marketplace placeholder content
    #[serde(rename = "Parked")]
    Parked,
    /// Loaded but unusable: client error, error page, or structurally empty
    #[serde(rename = "Broken")]
    Broken,
    /// Loaded with real content
    #[serde(rename = "ok")]
    Ok,
    /// Classification itself faulted; result is indeterminate
    #[serde(rename = "Other")]
    Other,
}

impl Status {
    /// Label used in the report output
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ServerError5xx => "5xx",
            Status::NotFound => "404",
            Status::Parked => "Parked",
            Status::Broken => "Broken",
            Status::Ok => "ok",
            Status::Other => "Other",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
