//! Navigation, status capture, and signal extraction for one attempt.
//!
//! The main-document HTTP status is not exposed by `goto`; it has to be
//! harvested from CDP network events registered before navigation starts.
//! Signal extraction runs one JavaScript evaluation returning a JSON object.

use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use futures::StreamExt;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::browser::BrowserSession;
use crate::checker::{PageProbe, ProbeOutcome};
use crate::classify::PageSignals;
use crate::config::CheckConfig;
use crate::error::{CheckError, TriageResult};

/// How long to wait for the main-document response event after navigation.
/// The event almost always arrives before `goto` returns; this bounds the
/// drain of the buffered stream.
const STATUS_EVENT_TIMEOUT: Duration = Duration::from_secs(3);

/// One evaluation, one JSON object. Body text is lower-cased in-page so the
/// phrase heuristics never re-scan megabytes in Rust.
const SIGNALS_SCRIPT: &str = r#"
    (function() {
        const body = document.body ? document.body.innerText : '';
        const meta = document.querySelector('meta[name="description"]');
        return {
            title: document.title || '',
            body_text: body.toLowerCase(),
            body_len: body.length,
            element_count: document.getElementsByTagName('*').length,
            meta_description: meta ? (meta.getAttribute('content') || '') : ''
        };
    })()
"#;

/// Navigate to `url` and capture the main document's HTTP status.
///
/// The event listener is registered before `goto` so the response event is
/// buffered even when it fires mid-navigation. Status matching prefers the
/// exact request URL and falls back to the first `Document` response, which
/// covers redirects. No event within the drain window yields `None`.
pub async fn navigate_and_status(
    page: &Page,
    url: &str,
    navigation_timeout: Duration,
) -> Result<Option<u16>, CheckError> {
    let mut events = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| CheckError::Navigation(format!("event listener setup failed: {e}")))?;

    match timeout(navigation_timeout, page.goto(url)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(CheckError::Navigation(e.to_string())),
        Err(_) => {
            return Err(CheckError::Navigation(format!(
                "navigation timeout after {} seconds",
                navigation_timeout.as_secs()
            )));
        }
    }

    let status = timeout(STATUS_EVENT_TIMEOUT, async {
        while let Some(event) = events.next().await {
            // Main document only, not images/css/js
            if event.response.url == url || event.r#type == ResourceType::Document {
                return u16::try_from(event.response.status).ok();
            }
        }
        None
    })
    .await
    .unwrap_or_else(|_| {
        debug!(url, "no main-document response event; treating status as unknown");
        None
    });

    trace!(url, ?status, "navigation complete");
    Ok(status)
}

/// Best-effort wait for the document to stop loading.
///
/// Polls `document.readyState` until `complete` or the budget elapses.
/// `wait_for_navigation` only covers the HTTP response; JS-rendered error
/// and parking pages need this extra window before inspection. Never fails:
/// a page that will not settle is inspected as-is.
pub async fn wait_for_quiescence(page: &Page, max_wait: Duration) {
    let start = tokio::time::Instant::now();
    let poll_interval = Duration::from_millis(100);

    loop {
        if start.elapsed() >= max_wait {
            warn!("quiescence wait exhausted, inspecting page as-is");
            return;
        }

        match page.evaluate("document.readyState").await {
            Ok(result) => {
                if let Ok(Some(state)) = result.into_value::<Option<String>>()
                    && state == "complete"
                {
                    trace!(
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "page reached quiescence"
                    );
                    // Small buffer for late-rendering placeholder content
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    return;
                }
            }
            Err(e) => {
                debug!("readyState check failed: {e}, retrying");
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Extract classification signals from the loaded document.
///
/// Failure here is a classification fault, not a navigation failure: the
/// page loaded but could not be inspected.
pub async fn extract_signals(page: &Page) -> Result<PageSignals, CheckError> {
    let result = page
        .evaluate(SIGNALS_SCRIPT)
        .await
        .map_err(|e| CheckError::Classification(format!("signals script failed: {e}")))?;

    let signals: PageSignals = result
        .into_value()
        .map_err(|e| CheckError::Classification(format!("signals deserialization failed: {e}")))?;

    Ok(signals)
}

/// Production probe: one fresh tab per attempt against the shared session.
pub struct BrowserProbe {
    session: Arc<BrowserSession>,
    config: CheckConfig,
}

impl BrowserProbe {
    #[must_use]
    pub fn new(session: Arc<BrowserSession>, config: CheckConfig) -> Self {
        Self { session, config }
    }

    async fn attempt(&self, url: &str) -> TriageResult<ProbeOutcome> {
        let page = self.session.new_page().await?;

        let status = navigate_and_status(&page, url, self.config.navigation_timeout()).await?;

        let outcome = match status {
            // Outage pages are never inspected; the retry loop owns them
            Some(500..=599) => ProbeOutcome {
                status,
                signals: PageSignals::default(),
            },
            // Client-error pages are inspected as-is for the note and the
            // substantial-content gate
            Some(400..=499) => ProbeOutcome {
                status,
                signals: extract_signals(&page).await?,
            },
            _ => {
                wait_for_quiescence(&page, self.config.quiescence_timeout()).await;
                ProbeOutcome {
                    status,
                    signals: extract_signals(&page).await?,
                }
            }
        };

        page.close().await;
        Ok(outcome)
    }
}

impl PageProbe for BrowserProbe {
    // Error paths drop the PageGuard, which closes the tab from its Drop.
    fn probe(&self, url: &str) -> impl Future<Output = TriageResult<ProbeOutcome>> + Send {
        self.attempt(url)
    }
}
