//! Advisory parked-page disambiguation.
//!
//! When the phrase heuristics say "parked", a short text summary can be
//! submitted to an LLM endpoint for a second opinion. The oracle is strictly
//! advisory: unconfigured, timed out, or confused all collapse to
//! `Inconclusive`, which keeps the heuristic verdict.

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::classify::PageSignals;
use crate::config::OracleSettings;

/// Cap on the body excerpt sent to the oracle.
const BODY_EXCERPT_CHARS: usize = 1500;

/// Three-valued advisory verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleVerdict {
    /// The page really is a parking/marketplace placeholder
    ConfirmedParked,
    /// Coincidental keyword match on a normal page
    Normal,
    /// No usable signal; the heuristic verdict stands
    Inconclusive,
}

/// Seam for the disambiguation capability.
pub trait ParkedOracle: Send + Sync {
    fn classify(&self, summary: &str) -> impl Future<Output = OracleVerdict> + Send;
}

/// Bounded text summary for the oracle: title, meta description, body head.
#[must_use]
pub fn summarize(signals: &PageSignals) -> String {
    let excerpt: String = signals.body_text.chars().take(BODY_EXCERPT_CHARS).collect();
    format!(
        "Title: {}\nMeta description: {}\nBody excerpt: {}",
        signals.title.trim(),
        signals.meta_description.trim(),
        excerpt.trim()
    )
}

/// Production oracle speaking the OpenAI-compatible chat-completions wire
/// format. Built once at startup from [`OracleSettings`].
pub struct HttpOracle {
    client: reqwest::Client,
    settings: OracleSettings,
}

impl HttpOracle {
    #[must_use]
    pub fn new(settings: OracleSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout() + Duration::from_secs(1))
            .build()
            .unwrap_or_default();
        Self { client, settings }
    }

    async fn ask(&self, api_key: &str, summary: &str) -> Result<OracleVerdict, reqwest::Error> {
        let body = json!({
            "model": self.settings.model,
            "temperature": 0,
            "max_tokens": 4,
            "messages": [
                {
                    "role": "system",
                    "content": "You judge whether a web page is a parked-domain or \
                                hosting-placeholder page. Reply with exactly one word: \
                                PARKED, NORMAL, or UNSURE."
                },
                { "role": "user", "content": summary }
            ]
        });

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: serde_json::Value = response.json().await?;
        let reply = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_uppercase();

        Ok(match reply.as_str() {
            "PARKED" => OracleVerdict::ConfirmedParked,
            "NORMAL" => OracleVerdict::Normal,
            other => {
                debug!(reply = other, "unrecognized oracle reply");
                OracleVerdict::Inconclusive
            }
        })
    }
}

impl ParkedOracle for HttpOracle {
    fn classify(&self, summary: &str) -> impl Future<Output = OracleVerdict> + Send {
        async move {
            let Some(api_key) = self.settings.api_key.clone() else {
                return OracleVerdict::Inconclusive;
            };

            match tokio::time::timeout(self.settings.timeout(), self.ask(&api_key, summary)).await {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) => {
                    debug!(error = %e, "oracle call failed");
                    OracleVerdict::Inconclusive
                }
                Err(_) => {
                    debug!("oracle call timed out");
                    OracleVerdict::Inconclusive
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_caps_the_body_excerpt() {
        let signals = PageSignals {
            title: "Some Title".to_string(),
            body_text: "x".repeat(5000),
            body_len: 5000,
            element_count: 100,
            meta_description: "desc".to_string(),
        };
        let summary = summarize(&signals);
        assert!(summary.starts_with("Title: Some Title"));
        assert!(summary.len() < 1700);
    }

    #[tokio::test]
    async fn one_word_replies_map_onto_verdicts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"NORMAL"}}]}"#)
            .create_async()
            .await;

        let oracle = HttpOracle::new(OracleSettings {
            api_key: Some("test-key".to_string()),
            endpoint: format!("{}/v1/chat/completions", server.url()),
            model: "test-model".to_string(),
            timeout_secs: 5,
        });
        assert_eq!(oracle.classify("summary").await, OracleVerdict::Normal);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn garbage_reply_is_inconclusive() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"maybe?"}}]}"#)
            .create_async()
            .await;

        let oracle = HttpOracle::new(OracleSettings {
            api_key: Some("test-key".to_string()),
            endpoint: format!("{}/v1/chat/completions", server.url()),
            model: "test-model".to_string(),
            timeout_secs: 5,
        });
        assert_eq!(oracle.classify("summary").await, OracleVerdict::Inconclusive);
    }

    #[tokio::test]
    async fn unconfigured_oracle_is_inconclusive_without_network() {
        let oracle = HttpOracle::new(OracleSettings {
            api_key: None,
            endpoint: "http://127.0.0.1:1/never".to_string(),
            model: "none".to_string(),
            timeout_secs: 1,
        });
        assert_eq!(oracle.classify("anything").await, OracleVerdict::Inconclusive);
    }
}
