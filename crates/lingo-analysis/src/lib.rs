mod client;

pub use client::HttpAnalyzer;

use lingo_types::Enrichment;

/// Word analysis provider interface
///
/// Best-effort: any field of the returned [`Enrichment`] may be absent.
/// Callers never retry.
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    /// Look up pronunciation, meanings, root and related words for `word`
    async fn enrich(&self, word: &str) -> Result<Enrichment, AnalyzeError>;

    /// Provider metadata
    fn metadata(&self) -> ProviderMetadata;
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub requires_api_key: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Analysis timed out after {0} ms")]
    Timeout(u64),
}
