//! Configuration for a triage run.

use std::time::Duration;

/// Tunables for one batch of checks.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Maximum page retry attempts for transient failures
    ///
    /// When navigation fails due to timeout, network error, or a 5xx
    /// response, the URL is retried up to this many times with exponential
    /// backoff. Attempts = retries + 1.
    ///
    /// Default: 3
    pub(crate) max_retries: u32,

    /// Timeout in seconds for `page.goto()` operations
    ///
    /// Prevents hangs on slow DNS, unresponsive servers, or streaming
    /// content. Exceeding it counts as a navigation failure.
    ///
    /// Default: 30 seconds
    pub(crate) navigation_timeout_secs: u64,

    /// Timeout in seconds for the post-load quiescence wait
    ///
    /// Best-effort wait for `document.readyState`; elapsed without
    /// completion is not an error.
    ///
    /// Default: 8 seconds
    pub(crate) quiescence_timeout_secs: u64,

    /// Number of URLs checked concurrently
    ///
    /// Default: 4, recommended range 3-5. Each in-flight check owns its own
    /// tab; they all share one browser session.
    pub(crate) concurrency: usize,

    /// Run the browser headless. Kept as a knob for local debugging.
    pub(crate) headless: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            navigation_timeout_secs: 30,
            quiescence_timeout_secs: 8,
            concurrency: 4,
            headless: true,
        }
    }
}

impl CheckConfig {
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn quiescence_timeout(&self) -> Duration {
        Duration::from_secs(self.quiescence_timeout_secs)
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Backoff delay before retry attempt `n+1`, doubling per attempt
    /// (1s, 2s, 4s for n = 0, 1, 2).
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(2u64.pow(attempt))
    }
}

/// Oracle connection settings, resolved from the environment once at startup.
#[derive(Debug, Clone, Default)]
pub struct OracleSettings {
    pub(crate) api_key: Option<String>,
    pub(crate) endpoint: String,
    pub(crate) model: String,
    pub(crate) timeout_secs: u64,
}

impl OracleSettings {
    /// Read `LINKTRIAGE_ORACLE_*` variables. Without an API key the oracle
    /// stays disabled and classification proceeds without it.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("LINKTRIAGE_ORACLE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            endpoint: std::env::var("LINKTRIAGE_ORACLE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            model: std::env::var("LINKTRIAGE_ORACLE_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout_secs: 15,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let config = CheckConfig::default();
        assert_eq!(config.max_retries(), 3);
        assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.concurrency(), 4);
        assert!(config.headless);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let config = CheckConfig::default();
        assert_eq!(config.backoff_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn concurrency_floor_is_one() {
        let config = CheckConfig::default().with_concurrency(0);
        assert_eq!(config.concurrency(), 1);
    }

    #[test]
    fn unconfigured_oracle_is_disabled() {
        let settings = OracleSettings::default();
        assert!(!settings.is_configured());
    }
}
