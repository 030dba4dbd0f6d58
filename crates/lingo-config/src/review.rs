use std::env;

use serde::{Deserialize, Serialize};

fn default_refresh_debounce_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Refresh signals arriving within this window collapse into one reload
    #[serde(default = "default_refresh_debounce_ms")]
    pub refresh_debounce_ms: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            refresh_debounce_ms: default_refresh_debounce_ms(),
        }
    }
}

impl ReviewConfig {
    pub fn new() -> Self {
        let refresh_debounce_ms = env::var("LINGO_REFRESH_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_refresh_debounce_ms);

        Self {
            refresh_debounce_ms,
        }
    }
}
