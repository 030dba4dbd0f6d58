use std::env;

use serde::{Deserialize, Serialize};

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

/// Word store endpoint and the account key sent with every request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        let api_url = env::var("LINGO_API_URL").unwrap_or_else(|_| default_api_url());
        let api_key = env::var("LINGO_API_KEY").unwrap_or_default();

        Self { api_url, api_key }
    }

    pub fn words_endpoint(&self) -> String {
        format!("{}/api/words", self.api_url.trim_end_matches('/'))
    }
}
