//! Phrase tables backing the content heuristics.
//!
//! Rules live here as ordered data rather than inline literals so each
//! phrase can be unit-tested and the set extended without touching the
//! classifier control flow. Order matters: the first match wins and its
//! phrase text lands in the report note.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bumped whenever a table's contents or ordering changes.
pub const PHRASE_RULES_VERSION: u32 = 1;

/// Domain-parking and domain-marketplace phrases.
pub const PARKED_PHRASES: &[&str] = &[
    "domain for sale",
    "this domain is for sale",
    "buy this domain",
    "domain is parked",
    "parked domain",
    "domain parking",
    "make an offer on this domain",
    "this domain may be for sale",
    "purchase this domain",
    "hugedomains",
    "afternic",
    "sedo",
    "dan.com",
    "domain broker",
    "premium domain",
];

/// Hosting-provider default pages. A freshly provisioned server with no
/// deployed site counts as parked for triage purposes.
pub const HOSTING_DEFAULT_PHRASES: &[&str] = &[
    "welcome to nginx",
    "it works!",
    "index of /",
    "apache2 ubuntu default page",
    "apache2 debian default page",
    "default web site page",
    "iis windows server",
    "welcome to your new website",
    "plesk default page",
    "cpanel, inc.",
    "future home of something quite cool",
];

/// Construction placeholders and rendered error pages.
pub const CONSTRUCTION_ERROR_PHRASES: &[&str] = &[
    "under construction",
    "coming soon",
    "internal server error",
    "fatal error",
    "service unavailable",
    "database error",
    "error establishing a database connection",
    "this page isn't working",
    "an error occurred while processing your request",
];

/// Matches rendered error banners like "error 503", "server error",
/// "application error".
pub static ERROR_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\berror\s+\d{3}\b|\bserver error\b|\bapplication error\b")
        .expect("error-code pattern compiles")
});

/// First parked or hosting-default phrase found in the haystack, if any.
/// The haystack must already be lower-cased.
#[must_use]
pub fn first_parked_match(haystack: &str) -> Option<&'static str> {
    PARKED_PHRASES
        .iter()
        .chain(HOSTING_DEFAULT_PHRASES.iter())
        .find(|phrase| haystack.contains(*phrase))
        .copied()
}

/// First construction/error phrase found in the haystack, if any.
#[must_use]
pub fn first_broken_match(haystack: &str) -> Option<&'static str> {
    CONSTRUCTION_ERROR_PHRASES
        .iter()
        .find(|phrase| haystack.contains(*phrase))
        .copied()
}
