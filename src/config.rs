use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the CRM backend the aggregation reads from.
///
/// The per-source timeout is deliberately shorter than the overall request
/// timeout so that one slow secondary source degrades to its fallback value
/// instead of stalling the whole aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    pub base_url: String,
    pub source_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub match_limit: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            source_timeout_ms: 3_000,
            request_timeout_ms: 10_000,
            match_limit: 5,
        }
    }
}

impl BackendConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
