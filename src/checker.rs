//! Per-URL check orchestration: the retry/backoff state machine that turns
//! one normalized URL into exactly one settled verdict.
//!
//! Transient failures (navigation errors, 5xx responses) are retried with
//! doubling backoff and settle to `5xx` on budget exhaustion. Faults while
//! inspecting a loaded page settle to `Other`. A check never propagates an
//! error to its caller.

use std::time::Instant;

use tracing::{debug, warn};

use crate::classify::{
    ContentVerdict, PageSignals, ResponseVerdict, broken_verdict, classify_content,
    classify_response, is_substantial,
};
use crate::config::CheckConfig;
use crate::error::{CheckError, TriageResult};
use crate::oracle::{OracleVerdict, ParkedOracle, summarize};
use crate::status::Status;

/// Settled outcome for one URL. Immutable once produced; consumed by the
/// report builder.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub url: String,
    pub status: Status,
    pub note: String,
    pub error_detail: Option<String>,
}

/// Everything one attempt observed: the main-document HTTP status and the
/// rendered-page signals.
///
/// Signals are not populated for 5xx statuses; that path never inspects
/// content, so an uninspectable outage page cannot divert a retry into a
/// classification fault.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    pub status: Option<u16>,
    pub signals: PageSignals,
}

/// One navigation attempt against a real rendering engine. The seam exists
/// so the state machine is testable without a browser.
pub trait PageProbe: Send + Sync {
    fn probe(&self, url: &str) -> impl Future<Output = TriageResult<ProbeOutcome>> + Send;
}

/// Drive one URL through attempts until it settles.
pub async fn check_url<P, O>(
    url: &str,
    probe: &P,
    oracle: &O,
    config: &CheckConfig,
) -> CheckResult
where
    P: PageProbe,
    O: ParkedOracle,
{
    let started = Instant::now();
    let max_retries = config.max_retries();

    let mut attempt = 0u32;
    let result = loop {
        let attempts_made = attempt + 1;
        match probe.probe(url).await {
            Err(e) if e.is_retryable() => {
                if attempt < max_retries {
                    let delay = config.backoff_for_attempt(attempt);
                    debug!(
                        url,
                        attempt = attempts_made,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                warn!(url, attempts = attempts_made, error = %e, "retry budget exhausted");
                break CheckResult {
                    url: url.to_string(),
                    status: Status::ServerError5xx,
                    note: format!("navigation failed after {attempts_made} attempts: {e}"),
                    error_detail: Some(e.to_string()),
                };
            }
            Err(e) => {
                break settle_fault(url, &e);
            }
            Ok(outcome) => match classify_response(outcome.status) {
                ResponseVerdict::ServerError { code } => {
                    if attempt < max_retries {
                        let delay = config.backoff_for_attempt(attempt);
                        debug!(
                            url,
                            attempt = attempts_made,
                            code,
                            delay_secs = delay.as_secs(),
                            "server error, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    break CheckResult {
                        url: url.to_string(),
                        status: Status::ServerError5xx,
                        note: format!("HTTP {code} after {attempts_made} attempts"),
                        error_detail: None,
                    };
                }
                verdict => break settle_loaded(url, verdict, &outcome.signals, oracle).await,
            },
        }
    };

    debug!(
        url,
        status = %result.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "check settled"
    );
    result
}

/// Non-retryable fault: the page loaded but analysis blew up. Contained
/// here; the batch never sees it.
fn settle_fault(url: &str, error: &CheckError) -> CheckResult {
    warn!(url, error = %error, "classification fault");
    CheckResult {
        url: url.to_string(),
        status: Status::Other,
        note: error.to_string(),
        error_detail: Some(error.to_string()),
    }
}

/// Settle a check whose document actually loaded.
async fn settle_loaded<O: ParkedOracle>(
    url: &str,
    verdict: ResponseVerdict,
    signals: &PageSignals,
    oracle: &O,
) -> CheckResult {
    match verdict {
        ResponseVerdict::NotFound => {
            // Content is still consulted for note enrichment, never for the
            // verdict.
            let note = match classify_content(signals) {
                ContentVerdict::Parked { phrase } => {
                    format!("HTTP 404; page shows parked phrase: \"{phrase}\"")
                }
                _ => "HTTP 404".to_string(),
            };
            CheckResult {
                url: url.to_string(),
                status: Status::NotFound,
                note,
                error_detail: None,
            }
        }
        ResponseVerdict::Forbidden => {
            if is_substantial(signals) {
                CheckResult {
                    url: url.to_string(),
                    status: Status::Ok,
                    note: "HTTP 403 with substantial content; possible bot block".to_string(),
                    error_detail: None,
                }
            } else {
                CheckResult {
                    url: url.to_string(),
                    status: Status::Broken,
                    note: "HTTP 403 without substantial content".to_string(),
                    error_detail: None,
                }
            }
        }
        ResponseVerdict::ClientError { code } => CheckResult {
            url: url.to_string(),
            status: Status::Broken,
            note: format!("HTTP {code}"),
            error_detail: None,
        },
        ResponseVerdict::Content { code } => settle_content(url, code, signals, oracle).await,
        // 5xx is handled by the retry loop before this point
        ResponseVerdict::ServerError { code } => CheckResult {
            url: url.to_string(),
            status: Status::ServerError5xx,
            note: format!("HTTP {code}"),
            error_detail: None,
        },
    }
}

async fn settle_content<O: ParkedOracle>(
    url: &str,
    code: Option<u16>,
    signals: &PageSignals,
    oracle: &O,
) -> CheckResult {
    let healthy_note = || match code {
        Some(c) => format!("HTTP {c}"),
        None => "loaded without an HTTP status".to_string(),
    };

    match classify_content(signals) {
        ContentVerdict::Parked { phrase } => {
            match oracle.classify(&summarize(signals)).await {
                OracleVerdict::Normal => {
                    debug!(url, phrase, "oracle overrode parked match");
                    // Coincidental keyword match; fall through to the Broken
                    // test and the optimistic fallback.
                    match broken_verdict(signals) {
                        ContentVerdict::Broken { reason } => CheckResult {
                            url: url.to_string(),
                            status: Status::Broken,
                            note: reason,
                            error_detail: None,
                        },
                        _ => CheckResult {
                            url: url.to_string(),
                            status: Status::Ok,
                            note: healthy_note(),
                            error_detail: None,
                        },
                    }
                }
                OracleVerdict::ConfirmedParked | OracleVerdict::Inconclusive => CheckResult {
                    url: url.to_string(),
                    status: Status::Parked,
                    note: format!("parked phrase: \"{phrase}\""),
                    error_detail: None,
                },
            }
        }
        ContentVerdict::Broken { reason } => CheckResult {
            url: url.to_string(),
            status: Status::Broken,
            note: reason,
            error_detail: None,
        },
        ContentVerdict::Healthy => CheckResult {
            url: url.to_string(),
            status: Status::Ok,
            note: healthy_note(),
            error_detail: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubProbe {
        outcomes: Mutex<Vec<TriageResult<ProbeOutcome>>>,
        calls: AtomicU32,
    }

    impl StubProbe {
        fn new(outcomes: Vec<TriageResult<ProbeOutcome>>) -> Self {
            let mut outcomes = outcomes;
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PageProbe for StubProbe {
        fn probe(&self, _url: &str) -> impl Future<Output = TriageResult<ProbeOutcome>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(CheckError::Navigation("stub exhausted".into())));
            async move { next }
        }
    }

    struct StubOracle(OracleVerdict);

    impl ParkedOracle for StubOracle {
        fn classify(&self, _summary: &str) -> impl Future<Output = OracleVerdict> + Send {
            let verdict = self.0;
            async move { verdict }
        }
    }

    fn loaded(status: Option<u16>, body: &str, elements: usize) -> TriageResult<ProbeOutcome> {
        Ok(ProbeOutcome {
            status,
            signals: PageSignals {
                title: String::new(),
                body_text: body.to_lowercase(),
                body_len: body.chars().count(),
                element_count: elements,
                meta_description: String::new(),
            },
        })
    }

    fn config() -> CheckConfig {
        CheckConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_failures_exhaust_into_5xx() {
        let probe = StubProbe::new(vec![
            Err(CheckError::Navigation("dns failure".into())),
            Err(CheckError::Navigation("dns failure".into())),
            Err(CheckError::Navigation("dns failure".into())),
            Err(CheckError::Navigation("dns failure".into())),
        ]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let start = tokio::time::Instant::now();
        let result = check_url("https://down.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::ServerError5xx);
        assert_eq!(probe.calls(), 4);
        assert!(result.note.contains("4 attempts"));
        assert!(result.note.contains("dns failure"));
        // 1 + 2 + 4 seconds of backoff, measured on the paused clock
        assert!(start.elapsed() >= std::time::Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_500_settles_with_attempt_count() {
        let probe = StubProbe::new(vec![
            loaded(Some(500), "", 0),
            loaded(Some(500), "", 0),
            loaded(Some(500), "", 0),
            loaded(Some(500), "", 0),
        ]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://erroring.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::ServerError5xx);
        assert_eq!(probe.calls(), 4);
        assert!(result.note.contains('4'));
        assert!(result.note.contains("500"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_503_recovers() {
        let body = "plenty of ordinary page content here. ".repeat(20);
        let probe = StubProbe::new(vec![
            loaded(Some(503), "", 0),
            loaded(Some(200), &body, 80),
        ]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://flaky.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::Ok);
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test]
    async fn not_found_wins_over_content() {
        let probe = StubProbe::new(vec![loaded(Some(404), "page not found", 30)]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://gone.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::NotFound);
        assert_eq!(result.note, "HTTP 404");
    }

    #[tokio::test]
    async fn forbidden_with_substantial_content_is_ok() {
        let body = "product listing content with details. ".repeat(60);
        let probe = StubProbe::new(vec![loaded(Some(403), &body, 150)]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://guarded.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::Ok);
        assert!(result.note.contains("bot block"));
    }

    #[tokio::test]
    async fn forbidden_stub_is_broken() {
        let probe = StubProbe::new(vec![loaded(Some(403), "403 forbidden", 5)]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://blocked.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::Broken);
    }

    #[tokio::test]
    async fn parked_phrase_settles_parked_without_oracle_confirmation() {
        let probe = StubProbe::new(vec![loaded(
            Some(200),
            "this domain is for sale. contact the broker.",
            25,
        )]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://lapsed.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::Parked);
        assert!(result.note.contains("domain is for sale") || result.note.contains("for sale"));
    }

    #[tokio::test]
    async fn oracle_normal_overrides_parked() {
        let body = format!(
            "our agency helps you buy this domain name and many others. {}",
            "marketplace analysis content. ".repeat(30)
        );
        let probe = StubProbe::new(vec![loaded(Some(200), &body, 90)]);
        let oracle = StubOracle(OracleVerdict::Normal);

        let result = check_url("https://broker-blog.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::Ok);
    }

    #[tokio::test]
    async fn empty_page_is_broken() {
        let probe = StubProbe::new(vec![loaded(Some(200), "", 0)]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://husk.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::Broken);
        assert!(result.note.contains("structurally empty"));
    }

    #[tokio::test]
    async fn classification_fault_settles_other() {
        let probe = StubProbe::new(vec![Err(CheckError::Classification(
            "signals script failed: detached frame".into(),
        ))]);
        let oracle = StubOracle(OracleVerdict::Inconclusive);

        let result = check_url("https://weird.example/", &probe, &oracle, &config()).await;

        assert_eq!(result.status, Status::Other);
        assert_eq!(probe.calls(), 1);
        assert!(result.note.contains("detached frame"));
    }
}
