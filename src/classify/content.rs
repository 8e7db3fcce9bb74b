//! Content heuristics over a rendered document.
//!
//! Pure and synchronous: the same signals always produce the same verdict.
//! The advisory oracle consult happens in the orchestrator, between the
//! Parked and Broken tests.

use serde::Deserialize;

use super::phrases;

/// Read-only view over a rendered document, computed fresh per attempt.
/// Content may change between retries, so signals are never cached.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageSignals {
    #[serde(default)]
    pub title: String,
    /// Body text, already lower-cased by the extraction script.
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub body_len: usize,
    #[serde(default)]
    pub element_count: usize,
    #[serde(default)]
    pub meta_description: String,
}

impl PageSignals {
    /// Lower-cased title + body haystack for phrase matching.
    #[must_use]
    fn haystack(&self) -> String {
        let mut text = self.title.to_lowercase();
        text.push(' ');
        text.push_str(&self.body_text);
        text
    }
}

/// Verdict of the ordered content rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentVerdict {
    /// A parked/marketplace/hosting-default phrase matched
    Parked { phrase: &'static str },
    /// An error phrase, error-code pattern, or structural emptiness matched
    Broken { reason: String },
    /// No negative signal
    Healthy,
}

/// First parked or hosting-default phrase in title or body, if any.
#[must_use]
pub fn parked_phrase(signals: &PageSignals) -> Option<&'static str> {
    phrases::first_parked_match(&signals.haystack())
}

/// Broken test: construction/error phrase, "error NNN" pattern, or a
/// structurally empty document (fewer than 10 elements and under 200 chars).
#[must_use]
pub fn broken_verdict(signals: &PageSignals) -> ContentVerdict {
    let haystack = signals.haystack();
    if let Some(phrase) = phrases::first_broken_match(&haystack) {
        return ContentVerdict::Broken {
            reason: format!("error phrase: \"{phrase}\""),
        };
    }
    if let Some(matched) = phrases::ERROR_CODE_RE.find(&haystack) {
        return ContentVerdict::Broken {
            reason: format!("error pattern: \"{}\"", matched.as_str()),
        };
    }
    if signals.element_count < 10 && signals.body_len < 200 {
        return ContentVerdict::Broken {
            reason: format!(
                "structurally empty page ({} elements, {} chars)",
                signals.element_count, signals.body_len
            ),
        };
    }
    ContentVerdict::Healthy
}

/// Full ordered rule set: Parked strictly before Broken, optimistic fallback.
#[must_use]
pub fn classify_content(signals: &PageSignals) -> ContentVerdict {
    if let Some(phrase) = parked_phrase(signals) {
        return ContentVerdict::Parked { phrase };
    }
    broken_verdict(signals)
}

/// Substantial-content test, used to separate a real page behind a 403 from
/// a bot-block stub: enough body text, enough DOM, and not a bare
/// forbidden/access-denied page.
#[must_use]
pub fn is_substantial(signals: &PageSignals) -> bool {
    if signals.body_len < 400 || signals.element_count < 15 {
        return false;
    }
    let bare_forbidden = signals.body_len < 800
        && (signals.body_text.contains("forbidden") || signals.body_text.contains("access denied"));
    !bare_forbidden
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(title: &str, body: &str, elements: usize) -> PageSignals {
        PageSignals {
            title: title.to_string(),
            body_text: body.to_lowercase(),
            body_len: body.chars().count(),
            element_count: elements,
            meta_description: String::new(),
        }
    }

    #[test]
    fn parked_takes_precedence_over_broken() {
        let page = signals(
            "Great Domain",
            "domain for sale. fatal error rendering placeholder",
            40,
        );
        assert!(matches!(
            classify_content(&page),
            ContentVerdict::Parked { phrase: "domain for sale" }
        ));
    }

    #[test]
    fn nginx_default_page_is_parked() {
        let page = signals(
            "Welcome to nginx!",
            "Welcome to nginx! If you see this page, the nginx web server is successfully installed.",
            8,
        );
        assert!(matches!(
            classify_content(&page),
            ContentVerdict::Parked { .. }
        ));
    }

    #[test]
    fn empty_page_is_broken() {
        let page = signals("", "", 0);
        match classify_content(&page) {
            ContentVerdict::Broken { reason } => {
                assert!(reason.contains("structurally empty"));
            }
            other => panic!("expected Broken, got {other:?}"),
        }
    }

    #[test]
    fn error_banner_is_broken() {
        let page = signals("Oops", "Error 503 backend fetch failed", 25);
        assert!(matches!(
            classify_content(&page),
            ContentVerdict::Broken { .. }
        ));
    }

    #[test]
    fn normal_page_is_healthy() {
        let body = "Product listing with descriptions and prices. ".repeat(20);
        let page = signals("Shop", &body, 120);
        assert_eq!(classify_content(&page), ContentVerdict::Healthy);
    }

    #[test]
    fn classification_is_idempotent() {
        let page = signals("Shop", &"text content here ".repeat(30), 50);
        assert_eq!(classify_content(&page), classify_content(&page));
    }

    #[test]
    fn small_page_is_not_substantial() {
        let page = signals("x", "short", 5);
        assert!(!is_substantial(&page));
    }

    #[test]
    fn bare_forbidden_page_is_not_substantial() {
        let body = format!("403 forbidden. access denied by policy. {}", "x".repeat(400));
        let page = signals("Forbidden", &body, 20);
        assert!(!is_substantial(&page));
    }

    #[test]
    fn rich_listing_is_substantial() {
        let body = "normal product listing content. ".repeat(70);
        let page = signals("Catalog", &body, 150);
        assert!(is_substantial(&page));
    }

    #[test]
    fn blank_but_tall_dom_is_not_broken() {
        // 100+ elements with little text fails the structural-empty rule.
        let page = signals("App", "loading", 120);
        assert_eq!(classify_content(&page), ContentVerdict::Healthy);
    }
}
