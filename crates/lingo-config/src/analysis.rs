use std::env;

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Base URL serving `/api/analyze` and `/api/word-enrichment`
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_url: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AnalysisConfig {
    /// Falls back to the store URL when `LINGO_ANALYSIS_URL` is unset
    pub fn new(store_url: &str) -> Self {
        let enabled = env::var("LINGO_ANALYSIS_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_enabled);

        let api_url = env::var("LINGO_ANALYSIS_URL").unwrap_or_else(|_| store_url.to_string());

        let timeout_ms = env::var("LINGO_ANALYSIS_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_ms);

        Self {
            enabled,
            api_url,
            timeout_ms,
        }
    }
}
