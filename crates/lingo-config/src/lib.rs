use serde::{Deserialize, Serialize};

use self::analysis::AnalysisConfig;
use self::capture::CaptureConfig;
use self::review::ReviewConfig;
use self::store::StoreConfig;

pub mod analysis;
pub mod capture;
pub mod review;
pub mod store;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub analysis: AnalysisConfig,
    pub capture: CaptureConfig,
    pub review: ReviewConfig,
}

impl Config {
    /// Build from environment variables, falling back to defaults
    pub fn new() -> Self {
        let store = StoreConfig::new();
        let analysis = AnalysisConfig::new(&store.api_url);

        Config {
            store,
            analysis,
            capture: CaptureConfig::new(),
            review: ReviewConfig::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profile_fills_defaults() {
        let json = r#"{ "store": { "api_key": "k-123" }, "review": {} }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.store.api_key, "k-123");
        assert_eq!(config.store.api_url, "http://localhost:3000");
        assert_eq!(config.analysis.timeout_ms, 30_000);
        assert!(config.analysis.enabled);
        assert_eq!(config.capture.clipboard_poll_ms, 500);
        assert_eq!(config.review.refresh_debounce_ms, 100);
    }

    #[test]
    fn words_endpoint_ignores_trailing_slash() {
        let store = StoreConfig {
            api_url: "https://words.example.com/".into(),
            api_key: String::new(),
        };
        assert_eq!(store.words_endpoint(), "https://words.example.com/api/words");
    }
}
