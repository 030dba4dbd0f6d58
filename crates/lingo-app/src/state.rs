use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use lingo_analysis::{Analyzer, HttpAnalyzer};
use lingo_config::Config;
use lingo_core::capture::{CaptureResolver, TokenPicker};
use lingo_core::clock::{Clock, SystemClock};
use lingo_core::notify::RefreshNotifier;
use lingo_core::review::ReviewScheduler;
use lingo_core::store::{AccountId, MemoryStore, VocabularyStore};
use lingo_store::HttpWordStore;
use tokio::sync::RwLock;

/// Account used when running against the in-memory store without a key
const LOCAL_ACCOUNT: &str = "local";

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub store: Arc<dyn VocabularyStore>,
    remote: Option<Arc<HttpWordStore>>,
    pub analyzer: Option<Arc<dyn Analyzer>>,
    pub clock: Arc<dyn Clock>,
    pub account: AccountId,
}

impl AppState {
    /// `account` overrides the configured API key
    pub fn new(config: Config, account: Option<String>, memory: bool) -> anyhow::Result<Self> {
        let key = account.unwrap_or_else(|| config.store.api_key.clone());

        let mut remote = None;
        let (store, account): (Arc<dyn VocabularyStore>, AccountId) = if memory {
            tracing::info!("Using in-memory word store, nothing will be persisted");
            let key = if key.trim().is_empty() {
                LOCAL_ACCOUNT.to_string()
            } else {
                key
            };
            let store: Arc<dyn VocabularyStore> = Arc::new(MemoryStore::new());
            (store, AccountId::new(key))
        } else {
            if key.trim().is_empty() {
                bail!("No API key configured, set LINGO_API_KEY or pass --account");
            }
            tracing::info!("Using word store at {}", config.store.api_url);
            let http = Arc::new(HttpWordStore::new(config.store.words_endpoint()));
            remote = Some(http.clone());
            let store: Arc<dyn VocabularyStore> = http;
            (store, AccountId::new(key))
        };

        let analyzer: Option<Arc<dyn Analyzer>> = if config.analysis.enabled {
            let api_url = if config.analysis.api_url.is_empty() {
                config.store.api_url.clone()
            } else {
                config.analysis.api_url.clone()
            };
            Some(Arc::new(HttpAnalyzer::new(
                api_url,
                Duration::from_millis(config.analysis.timeout_ms),
            )))
        } else {
            tracing::warn!("Word analysis disabled, new entries will not be enriched");
            None
        };

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            remote,
            analyzer,
            clock: Arc::new(SystemClock),
            account,
        })
    }

    pub fn resolver(
        &self,
        picker: Arc<dyn TokenPicker>,
        notifier: Arc<dyn RefreshNotifier>,
    ) -> CaptureResolver {
        let resolver =
            CaptureResolver::new(self.store.clone(), picker, notifier, self.clock.clone());

        match &self.analyzer {
            Some(analyzer) => resolver.with_analyzer(analyzer.clone()),
            None => resolver,
        }
    }

    /// Probe the remote store. `None` when running in memory.
    pub async fn check_store(&self) -> Option<anyhow::Result<usize>> {
        match &self.remote {
            Some(remote) => Some(remote.check_connection(&self.account).await),
            None => None,
        }
    }

    pub fn scheduler(&self) -> ReviewScheduler {
        ReviewScheduler::new(self.store.clone(), self.clock.clone())
    }
}
