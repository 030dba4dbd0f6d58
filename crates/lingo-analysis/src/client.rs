use std::time::Duration;

use async_trait::async_trait;
use lingo_types::{Enrichment, Meaning};
use serde::Deserialize;
use serde_json::json;

use crate::{AnalyzeError, Analyzer, ProviderMetadata};

/// Examples kept per meaning
const MAX_EXAMPLES: usize = 2;

/// Queries the pronunciation endpoint and the LLM enrichment endpoint
/// concurrently and merges whatever comes back.
#[derive(Clone)]
pub struct HttpAnalyzer {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl HttpAnalyzer {
    pub fn new(api_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn post_word(&self, path: &str, word: &str) -> Result<serde_json::Value, AnalyzeError> {
        let response = self
            .client
            .post(format!("{}{}", self.api_url, path))
            .json(&json!({ "word": word }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnalyzeError::ApiError(format!(
                "{} returned HTTP {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AnalyzeError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn enrich(&self, word: &str) -> Result<Enrichment, AnalyzeError> {
        let lookups = async {
            tokio::join!(
                self.post_word("/api/analyze", word),
                self.post_word("/api/word-enrichment", word),
            )
        };

        let (basic, full) = tokio::time::timeout(self.timeout, lookups)
            .await
            .map_err(|_| AnalyzeError::Timeout(self.timeout.as_millis() as u64))?;

        match (basic, full) {
            (Err(basic_err), Err(full_err)) => {
                tracing::debug!("Enrichment endpoint also failed: {}", full_err);
                Err(basic_err)
            }
            (basic, full) => {
                if let Err(e) = &basic {
                    tracing::warn!("Pronunciation lookup failed for '{}': {}", word, e);
                }
                if let Err(e) = &full {
                    tracing::warn!("Enrichment lookup failed for '{}': {}", word, e);
                }
                Ok(merge_payloads(basic.ok(), full.ok()))
            }
        }
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "lingo-http".to_string(),
            requires_api_key: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BasicPayload {
    phonetic: Option<String>,
    audio_url: Option<String>,
    /// Present when the provider could not produce structured JSON
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EnrichmentPayload {
    meanings: Vec<serde_json::Value>,
    root: Option<String>,
    root_meaning: Option<String>,
    word_family: Vec<String>,
    explanation: Option<String>,
}

/// Merge the two provider payloads into one record.
///
/// Malformed meanings are skipped individually rather than failing the
/// whole payload.
pub(crate) fn merge_payloads(
    basic: Option<serde_json::Value>,
    full: Option<serde_json::Value>,
) -> Enrichment {
    let basic: BasicPayload = basic
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let full: EnrichmentPayload = full
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let meanings = full
        .meanings
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Meaning>(v).ok())
        .filter(|m| !m.part_of_speech.trim().is_empty() && !m.definitions.is_empty())
        .map(|mut m| {
            m.examples.truncate(MAX_EXAMPLES);
            m
        })
        .collect();

    let raw = match (&basic.phonetic, &basic.audio_url) {
        (None, None) => basic.text.filter(|t| !t.trim().is_empty()),
        _ => None,
    };

    Enrichment {
        phonetic: basic.phonetic,
        audio_url: basic.audio_url,
        meanings,
        root: full.root,
        root_meaning: full.root_meaning,
        related_words: full.word_family,
        explanation: full.explanation,
        raw,
    }
}
