// crates/client/src/config.rs
//! Client configuration.

use std::time::Duration;

/// Tunables for a [`crate::JobBoardClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// JOBBOARD_API_URL env var, defaulting to the local dev server.
    pub base_url: String,
    /// Page size for the feed; the server caps this at 100.
    pub page_limit: u32,
    /// Trailing debounce window for filter edits.
    pub debounce: Duration,
    /// Per-request timeout on the underlying HTTP client.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("JOBBOARD_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            page_limit: 20,
            debounce: Duration::from_millis(300),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Default config pointed at an explicit server. Used by tests and by
    /// consumers that do not want env-var lookup.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }
}
