//! HTTP status decision table.
//!
//! Maps the (possibly absent) main-document status code to the next step of
//! a check. Absence of a response object never reaches this table; that is
//! the navigation error path.

/// What the status code alone tells us to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseVerdict {
    /// 500-599: outage candidate, subject to the retry budget
    ServerError { code: u16 },
    /// 404: confirmed missing, not retried
    NotFound,
    /// 403: decided by the substantial-content test
    Forbidden,
    /// Other 4xx: client error, unusable as a link target
    ClientError { code: u16 },
    /// 2xx, or no status but a document loaded: content classification decides
    Content { code: Option<u16> },
}

/// Classify the main-document status code.
#[must_use]
pub fn classify_response(status: Option<u16>) -> ResponseVerdict {
    match status {
        Some(code @ 500..=599) => ResponseVerdict::ServerError { code },
        Some(404) => ResponseVerdict::NotFound,
        Some(403) => ResponseVerdict::Forbidden,
        Some(code @ 400..=499) => ResponseVerdict::ClientError { code },
        code => ResponseVerdict::Content { code },
    }
}
