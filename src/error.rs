//! Error types for link checks
//!
//! Distinguishes transient navigation failures (retried with backoff) from
//! classification faults (settled as `Other`) and setup failures (fatal for
//! the whole batch).

use thiserror::Error;

/// Result type alias for check operations
pub type TriageResult<T> = Result<T, CheckError>;

/// Error types for check operations
#[derive(Debug, Error)]
pub enum CheckError {
    /// Input URL was empty after trimming
    #[error("empty URL")]
    EmptyInput,

    /// Navigation to the page failed (timeout, DNS, connection refused)
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Page loaded but inspecting it failed
    #[error("classification failed: {0}")]
    Classification(String),

    /// Browser session could not be established
    #[error("browser setup failed: {0}")]
    Setup(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CheckError {
    /// Check if the error is transient and the attempt should be retried
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckError::Navigation(_))
    }

    /// Check if the error poisons the whole batch
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, CheckError::Setup(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_is_retryable() {
        assert!(CheckError::Navigation("timeout".into()).is_retryable());
        assert!(!CheckError::Classification("bad json".into()).is_retryable());
        assert!(!CheckError::EmptyInput.is_retryable());
    }

    #[test]
    fn only_setup_is_fatal() {
        assert!(CheckError::Setup("no chrome".into()).is_fatal());
        assert!(!CheckError::Navigation("timeout".into()).is_fatal());
    }
}
