use std::sync::Arc;

use async_trait::async_trait;
use lingo_analysis::Analyzer;
use lingo_types::{CaptureRequest, EntryPatch, Enrichment, NewEntry, VocabularyEntry};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::{CaptureError, ValidationError};
use crate::language::{TextKind, classify, is_word_candidate, tokenize};
use crate::notify::RefreshNotifier;
use crate::preprocess::{
    DefaultPreprocessor, MAX_SENTENCE_CHARS, Preprocessor, normalize_word, same_sentence,
    truncate_chars,
};
use crate::store::{AccountId, StoreError, VocabularyStore, describe};

/// Sentences kept per entry, most recent first
pub const MAX_SENTENCES: usize = 20;

/// Tokens offered to the user when no stored word matches a sentence
pub const MAX_CANDIDATES: usize = 20;

/// Terminal state of one capture event
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    AlreadyExists(VocabularyEntry),
    Created(VocabularyEntry),
    SentenceAttached(VocabularyEntry),
    SentenceDuplicate(VocabularyEntry),
    CreatedWithSentence(VocabularyEntry),
    Cancelled,
}

impl CaptureOutcome {
    pub fn entry(&self) -> Option<&VocabularyEntry> {
        match self {
            CaptureOutcome::AlreadyExists(entry)
            | CaptureOutcome::Created(entry)
            | CaptureOutcome::SentenceAttached(entry)
            | CaptureOutcome::SentenceDuplicate(entry)
            | CaptureOutcome::CreatedWithSentence(entry) => Some(entry),
            CaptureOutcome::Cancelled => None,
        }
    }

    /// Whether the store was written
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            CaptureOutcome::Created(_)
                | CaptureOutcome::SentenceAttached(_)
                | CaptureOutcome::CreatedWithSentence(_)
        )
    }

    /// Short user-facing status line
    pub fn message(&self) -> String {
        match self {
            CaptureOutcome::AlreadyExists(e) => format!("\"{}\" is already saved", e.word),
            CaptureOutcome::Created(e) => format!("Saved \"{}\"", e.word),
            CaptureOutcome::SentenceAttached(e) => format!("Sentence added to \"{}\"", e.word),
            CaptureOutcome::SentenceDuplicate(e) => {
                format!("\"{}\" already has this sentence", e.word)
            }
            CaptureOutcome::CreatedWithSentence(e) => {
                format!("Saved \"{}\" with the sentence", e.word)
            }
            CaptureOutcome::Cancelled => "Capture cancelled".to_string(),
        }
    }
}

/// Human choice among candidate tokens. `None` means the user cancelled.
#[async_trait]
pub trait TokenPicker: Send + Sync {
    async fn pick(&self, candidates: &[String]) -> Option<String>;
}

/// Turns captured selections into vocabulary mutations
pub struct CaptureResolver {
    store: Arc<dyn VocabularyStore>,
    analyzer: Option<Arc<dyn Analyzer>>,
    picker: Arc<dyn TokenPicker>,
    notifier: Arc<dyn RefreshNotifier>,
    clock: Arc<dyn Clock>,
    preprocessor: DefaultPreprocessor,
}

/// Where a new entry came from
struct Origin<'a> {
    url: &'a str,
    title: &'a str,
}

impl CaptureResolver {
    pub fn new(
        store: Arc<dyn VocabularyStore>,
        picker: Arc<dyn TokenPicker>,
        notifier: Arc<dyn RefreshNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            analyzer: None,
            picker,
            notifier,
            clock,
            preprocessor: DefaultPreprocessor,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Resolve one captured selection.
    ///
    /// Words are looked up and created if missing. Sentences are attached to
    /// the first stored word they contain, in token order; if none matches
    /// the user picks a token. Cancelling `cancel` while waiting on the user
    /// or on enrichment ends with [`CaptureOutcome::Cancelled`] and leaves the
    /// store untouched.
    pub async fn resolve(
        &self,
        account: &AccountId,
        request: &CaptureRequest,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, CaptureError> {
        let text = self.preprocessor.process(&request.text);
        if text.is_empty() {
            return Err(ValidationError::Empty.into());
        }

        let tokens = tokenize(&text);
        if tokens.is_empty() {
            return Err(ValidationError::NoLetters.into());
        }

        let origin = Origin {
            url: &request.source_url,
            title: &request.source_title,
        };

        let kind = classify(&text);
        tracing::debug!("Capture classified as {:?}, {} tokens", kind, tokens.len());

        let outcome = match kind {
            TextKind::Word => self.capture_word(account, &text, &origin, cancel).await?,
            TextKind::Sentence => {
                self.capture_sentence(account, &text, tokens, &origin, cancel)
                    .await?
            }
        };

        self.finish(outcome)
    }

    /// Direct "add this word" action. Only single words are accepted.
    pub async fn add_word(
        &self,
        account: &AccountId,
        word: &str,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, CaptureError> {
        let text = self.preprocessor.process(word);
        if text.is_empty() {
            return Err(ValidationError::Empty.into());
        }
        if !is_word_candidate(&text) {
            return Err(ValidationError::NotAWord(text).into());
        }

        let origin = Origin { url: "", title: "" };
        let outcome = self.capture_word(account, &text, &origin, cancel).await?;

        self.finish(outcome)
    }

    /// Ask the analysis provider again for a stored entry and replace its
    /// enrichment fields.
    ///
    /// Returns the updated entry, or `None` when nothing was written: the
    /// entry is gone, the provider gave nothing back, or `cancel` fired first.
    pub async fn refresh_enrichment(
        &self,
        account: &AccountId,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<VocabularyEntry>, CaptureError> {
        let Some(entry) = self.store.get(account, id).await? else {
            return Ok(None);
        };

        let Some(enrichment) = self.enrich_or_cancel(&entry.word, cancel).await else {
            return Ok(None);
        };
        if enrichment.is_empty() {
            tracing::warn!("No enrichment for '{}', keeping stored fields", entry.word);
            return Ok(None);
        }

        let updated = self
            .store
            .update(account, id, EntryPatch::enrichment(enrichment))
            .await?
            .ok_or_else(|| CaptureError::Vanished(id.to_string()))?;

        tracing::info!("Enrichment refreshed: {}", describe(&updated));
        self.notifier.notify();
        Ok(Some(updated))
    }

    fn finish(&self, outcome: CaptureOutcome) -> Result<CaptureOutcome, CaptureError> {
        if outcome.is_mutation() {
            if let Some(entry) = outcome.entry() {
                tracing::info!("{}: {}", outcome.message(), describe(entry));
            }
            self.notifier.notify();
        } else {
            tracing::debug!("{}", outcome.message());
        }

        Ok(outcome)
    }

    async fn capture_word(
        &self,
        account: &AccountId,
        text: &str,
        origin: &Origin<'_>,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, CaptureError> {
        let word = normalize_word(text);

        if let Some(entry) = self.store.find_by_word(account, &word).await? {
            return Ok(CaptureOutcome::AlreadyExists(entry));
        }

        let Some(enrichment) = self.enrich_or_cancel(&word, cancel).await else {
            return Ok(CaptureOutcome::Cancelled);
        };

        let trimmed = text.trim();
        let new_entry = NewEntry {
            original_word: (trimmed != word).then(|| trimmed.to_string()),
            word: word.clone(),
            url: origin.url.to_string(),
            title: origin.title.to_string(),
            created_at: self.clock.now_ms(),
            enrichment,
            sentences: Vec::new(),
        };

        match self.store.create(account, new_entry).await {
            Ok(entry) => Ok(CaptureOutcome::Created(entry)),
            Err(StoreError::DuplicateKey(_)) => {
                // Lost a create race, the other capture owns the entry now
                tracing::debug!("Duplicate create for '{}', re-resolving", word);
                match self.store.find_by_word(account, &word).await? {
                    Some(entry) => Ok(CaptureOutcome::AlreadyExists(entry)),
                    None => Err(StoreError::DuplicateKey(word).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn capture_sentence(
        &self,
        account: &AccountId,
        text: &str,
        tokens: Vec<String>,
        origin: &Origin<'_>,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, CaptureError> {
        let sentence = truncate_chars(text, MAX_SENTENCE_CHARS);

        // Sequential on purpose: first match in token order wins
        for token in &tokens {
            if let Some(entry) = self.store.find_by_word(account, token).await? {
                tracing::debug!("Sentence matched stored word '{}'", entry.word);
                return self.attach(account, entry, sentence).await;
            }
        }

        let candidates: Vec<String> = tokens.into_iter().take(MAX_CANDIDATES).collect();

        let picked = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            picked = self.picker.pick(&candidates) => picked,
        };

        let Some(picked) = picked else {
            return Ok(CaptureOutcome::Cancelled);
        };

        let word = normalize_word(&picked);
        if !is_word_candidate(&word) {
            return Err(ValidationError::NotAWord(picked).into());
        }

        if let Some(entry) = self.store.find_by_word(account, &word).await? {
            return self.attach(account, entry, sentence).await;
        }

        let Some(enrichment) = self.enrich_or_cancel(&word, cancel).await else {
            return Ok(CaptureOutcome::Cancelled);
        };

        let new_entry = NewEntry {
            word: word.clone(),
            original_word: None,
            url: origin.url.to_string(),
            title: origin.title.to_string(),
            created_at: self.clock.now_ms(),
            enrichment,
            sentences: vec![sentence.clone()],
        };

        match self.store.create(account, new_entry).await {
            Ok(entry) => Ok(CaptureOutcome::CreatedWithSentence(entry)),
            Err(StoreError::DuplicateKey(_)) => {
                tracing::debug!("Duplicate create for '{}', attaching instead", word);
                match self.store.find_by_word(account, &word).await? {
                    Some(entry) => self.attach(account, entry, sentence).await,
                    None => Err(StoreError::DuplicateKey(word).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn attach(
        &self,
        account: &AccountId,
        entry: VocabularyEntry,
        sentence: String,
    ) -> Result<CaptureOutcome, CaptureError> {
        if entry.sentences.iter().any(|s| same_sentence(s, &sentence)) {
            return Ok(CaptureOutcome::SentenceDuplicate(entry));
        }

        let mut sentences = Vec::with_capacity(entry.sentences.len() + 1);
        sentences.push(sentence);
        sentences.extend(entry.sentences);
        sentences.truncate(MAX_SENTENCES);

        self.store
            .update(account, &entry.id, EntryPatch::sentences(sentences))
            .await?
            .map(CaptureOutcome::SentenceAttached)
            .ok_or(CaptureError::Vanished(entry.id))
    }

    /// `None` when cancelled before the provider answered
    async fn enrich_or_cancel(
        &self,
        word: &str,
        cancel: &CancellationToken,
    ) -> Option<Enrichment> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            enrichment = self.enrich(word) => Some(enrichment),
        }
    }

    async fn enrich(&self, word: &str) -> Enrichment {
        let Some(analyzer) = &self.analyzer else {
            return Enrichment::default();
        };

        match analyzer.enrich(word).await {
            Ok(enrichment) => enrichment,
            Err(e) => {
                tracing::warn!(
                    "Enrichment via {} failed for '{}': {}",
                    analyzer.metadata().name,
                    word,
                    e
                );
                Enrichment::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lingo_analysis::{AnalyzeError, ProviderMetadata};

    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;

    const NOW: i64 = 1_700_000_000_000;

    struct ScriptedPicker {
        choice: Option<String>,
        offered: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedPicker {
        fn choosing(choice: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                choice: choice.map(str::to_string),
                offered: Mutex::new(Vec::new()),
            })
        }

        fn offered(&self) -> Vec<Vec<String>> {
            self.offered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TokenPicker for ScriptedPicker {
        async fn pick(&self, candidates: &[String]) -> Option<String> {
            self.offered.lock().unwrap().push(candidates.to_vec());
            self.choice.clone()
        }
    }

    /// Waits until the capture is cancelled
    struct StalledPicker;

    #[async_trait]
    impl TokenPicker for StalledPicker {
        async fn pick(&self, _candidates: &[String]) -> Option<String> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct RecordingNotifier(AtomicUsize);

    impl RecordingNotifier {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl RefreshNotifier for RecordingNotifier {
        fn notify(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct StubAnalyzer;

    #[async_trait]
    impl Analyzer for StubAnalyzer {
        async fn enrich(&self, word: &str) -> Result<Enrichment, AnalyzeError> {
            Ok(Enrichment {
                phonetic: Some(format!("/{}/", word)),
                ..Default::default()
            })
        }

        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                name: "stub".into(),
                requires_api_key: false,
            }
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl Analyzer for FailingAnalyzer {
        async fn enrich(&self, _word: &str) -> Result<Enrichment, AnalyzeError> {
            Err(AnalyzeError::Timeout(30_000))
        }

        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                name: "failing".into(),
                requires_api_key: false,
            }
        }
    }

    /// Never answers
    struct StalledAnalyzer;

    #[async_trait]
    impl Analyzer for StalledAnalyzer {
        async fn enrich(&self, _word: &str) -> Result<Enrichment, AnalyzeError> {
            std::future::pending().await
        }

        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                name: "stalled".into(),
                requires_api_key: false,
            }
        }
    }

    /// Misses the first `hidden` lookups, as if another capture created the
    /// word right after each of them
    struct RacingStore {
        inner: Arc<MemoryStore>,
        hidden: AtomicUsize,
    }

    impl RacingStore {
        fn hiding(inner: Arc<MemoryStore>, hidden: usize) -> Arc<Self> {
            Arc::new(Self {
                inner,
                hidden: AtomicUsize::new(hidden),
            })
        }
    }

    #[async_trait]
    impl VocabularyStore for RacingStore {
        async fn find_by_word(
            &self,
            account: &AccountId,
            word: &str,
        ) -> Result<Option<VocabularyEntry>, StoreError> {
            let hide = self
                .hidden
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if hide {
                return Ok(None);
            }
            self.inner.find_by_word(account, word).await
        }

        async fn get(
            &self,
            account: &AccountId,
            id: &str,
        ) -> Result<Option<VocabularyEntry>, StoreError> {
            self.inner.get(account, id).await
        }

        async fn create(
            &self,
            account: &AccountId,
            entry: NewEntry,
        ) -> Result<VocabularyEntry, StoreError> {
            self.inner.create(account, entry).await
        }

        async fn update(
            &self,
            account: &AccountId,
            id: &str,
            patch: EntryPatch,
        ) -> Result<Option<VocabularyEntry>, StoreError> {
            self.inner.update(account, id, patch).await
        }

        async fn list_all(&self, account: &AccountId) -> Result<Vec<VocabularyEntry>, StoreError> {
            self.inner.list_all(account).await
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        resolver: CaptureResolver,
        account: AccountId,
    }

    fn harness(picker: Arc<dyn TokenPicker>) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let resolver = CaptureResolver::new(
            store.clone(),
            picker,
            notifier.clone(),
            Arc::new(FixedClock::new(NOW)),
        );

        Harness {
            store,
            notifier,
            resolver,
            account: AccountId::new("test-key"),
        }
    }

    async fn seed(h: &Harness, word: &str, sentences: &[&str]) -> VocabularyEntry {
        let entry = VocabularyEntry {
            id: format!("id-{}", word),
            word: word.to_string(),
            created_at: NOW - 1_000,
            sentences: sentences.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        h.store.insert(&h.account, entry.clone()).await;
        entry
    }

    async fn capture(h: &Harness, text: &str) -> Result<CaptureOutcome, CaptureError> {
        let request = CaptureRequest {
            text: text.to_string(),
            source_url: "https://example.com/article".into(),
            source_title: "Article".into(),
            source: lingo_types::TextSource::Websocket,
        };
        h.resolver
            .resolve(&h.account, &request, &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn new_word_is_created_with_enrichment() {
        let mut h = harness(ScriptedPicker::choosing(None));
        h.resolver = h.resolver.with_analyzer(Arc::new(StubAnalyzer));

        let outcome = capture(&h, "  Serendipity ").await.unwrap();

        let CaptureOutcome::Created(entry) = outcome else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert_eq!(entry.word, "serendipity");
        assert_eq!(entry.original_word.as_deref(), Some("Serendipity"));
        assert_eq!(entry.created_at, NOW);
        assert_eq!(entry.url, "https://example.com/article");
        assert_eq!(entry.enrichment.phonetic.as_deref(), Some("/serendipity/"));
        assert!(entry.sentences.is_empty());
        assert_eq!(h.notifier.count(), 1);
    }

    #[tokio::test]
    async fn existing_word_is_not_touched() {
        let h = harness(ScriptedPicker::choosing(None));
        let seeded = seed(&h, "cat", &[]).await;

        let outcome = capture(&h, "CAT").await.unwrap();

        assert_eq!(outcome, CaptureOutcome::AlreadyExists(seeded));
        assert_eq!(h.notifier.count(), 0);
    }

    #[tokio::test]
    async fn failed_enrichment_still_creates() {
        let mut h = harness(ScriptedPicker::choosing(None));
        h.resolver = h.resolver.with_analyzer(Arc::new(FailingAnalyzer));

        let outcome = capture(&h, "ephemeral").await.unwrap();

        let CaptureOutcome::Created(entry) = outcome else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert!(entry.enrichment.is_empty());
    }

    #[tokio::test]
    async fn blank_and_letterless_selections_are_rejected() {
        let h = harness(ScriptedPicker::choosing(None));

        let err = capture(&h, "   \n ").await.unwrap_err();
        assert!(matches!(err, CaptureError::Validation(ValidationError::Empty)));

        let err = capture(&h, "3.14").await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Validation(ValidationError::NoLetters)
        ));

        let err = capture(&h, "привет").await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Validation(ValidationError::NoLetters)
        ));
        assert_eq!(err.to_string(), "Selection contains no ASCII letters");
        assert!(h.store.list_all(&h.account).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sentence_attaches_to_stored_word() {
        let h = harness(ScriptedPicker::choosing(None));
        seed(&h, "cat", &[]).await;

        let outcome = capture(&h, "The cat sat on the mat.").await.unwrap();

        assert!(matches!(outcome, CaptureOutcome::SentenceAttached(_)));
        let stored = h.store.find_by_word(&h.account, "cat").await.unwrap().unwrap();
        assert_eq!(stored.sentences, vec!["The cat sat on the mat."]);
        assert_eq!(h.notifier.count(), 1);
    }

    #[tokio::test]
    async fn same_sentence_twice_is_a_duplicate() {
        let h = harness(ScriptedPicker::choosing(None));
        seed(&h, "cat", &[]).await;

        capture(&h, "The cat sat on the mat.").await.unwrap();
        let outcome = capture(&h, "  the CAT sat on the mat.  ").await.unwrap();

        assert!(matches!(outcome, CaptureOutcome::SentenceDuplicate(_)));
        let stored = h.store.find_by_word(&h.account, "cat").await.unwrap().unwrap();
        assert_eq!(stored.sentences, vec!["The cat sat on the mat."]);
        assert_eq!(h.notifier.count(), 1);
    }

    #[tokio::test]
    async fn first_token_in_sentence_order_wins() {
        let h = harness(ScriptedPicker::choosing(None));
        seed(&h, "mat", &[]).await;
        seed(&h, "cat", &[]).await;

        let outcome = capture(&h, "The cat sat on the mat.").await.unwrap();

        assert_eq!(outcome.entry().unwrap().word, "cat");
        let mat = h.store.find_by_word(&h.account, "mat").await.unwrap().unwrap();
        assert!(mat.sentences.is_empty());
    }

    #[tokio::test]
    async fn attached_sentence_becomes_head_and_cap_holds() {
        let h = harness(ScriptedPicker::choosing(None));
        let old: Vec<String> = (0..MAX_SENTENCES).map(|i| format!("Old {} dog.", i)).collect();
        let old_refs: Vec<&str> = old.iter().map(String::as_str).collect();
        seed(&h, "dog", &old_refs).await;

        capture(&h, "A new dog appeared!").await.unwrap();

        let stored = h.store.find_by_word(&h.account, "dog").await.unwrap().unwrap();
        assert_eq!(stored.sentences.len(), MAX_SENTENCES);
        assert_eq!(stored.sentences[0], "A new dog appeared!");
        assert_eq!(stored.sentences[1], "Old 0 dog.");
        assert!(!stored.sentences.contains(&format!("Old {} dog.", MAX_SENTENCES - 1)));
    }

    #[tokio::test]
    async fn unmatched_sentence_asks_the_user() {
        let picker = ScriptedPicker::choosing(Some("sat"));
        let h = harness(picker.clone());

        let outcome = capture(&h, "The cat sat on the mat.").await.unwrap();

        assert_eq!(
            picker.offered(),
            vec![vec!["the", "cat", "sat", "on", "mat"]]
        );
        let CaptureOutcome::CreatedWithSentence(entry) = outcome else {
            panic!("expected CreatedWithSentence, got {:?}", outcome);
        };
        assert_eq!(entry.word, "sat");
        assert_eq!(entry.sentences, vec!["The cat sat on the mat."]);
        assert_eq!(entry.title, "Article");
        assert_eq!(h.notifier.count(), 1);
    }

    #[tokio::test]
    async fn candidate_list_is_capped() {
        let picker = ScriptedPicker::choosing(None);
        let h = harness(picker.clone());
        let words: Vec<String> = (0..30)
            .map(|i| format!("w{}", char::from(b'a' + (i % 26) as u8)).repeat(i / 26 + 1))
            .collect();

        capture(&h, &words.join(" ")).await.unwrap();

        assert_eq!(picker.offered()[0].len(), MAX_CANDIDATES);
    }

    #[tokio::test]
    async fn user_cancel_leaves_no_trace() {
        let h = harness(ScriptedPicker::choosing(None));

        let outcome = capture(&h, "The cat sat on the mat.").await.unwrap();

        assert_eq!(outcome, CaptureOutcome::Cancelled);
        assert!(h.store.list_all(&h.account).await.unwrap().is_empty());
        assert_eq!(h.notifier.count(), 0);
    }

    #[tokio::test]
    async fn cancel_token_ends_a_pending_pick() {
        let h = harness(Arc::new(StalledPicker));
        let cancel = CancellationToken::new();
        let request = CaptureRequest::manual("Nobody knows this sentence.");

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = h.resolver.resolve(&h.account, &request, &cancel).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::Cancelled);
        assert!(h.store.list_all(&h.account).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_error() {
        let h = harness(ScriptedPicker::choosing(None));
        h.store.set_offline(true);

        let err = capture(&h, "The cat sat on the mat.").await.unwrap_err();

        assert!(matches!(
            err,
            CaptureError::Store(StoreError::Unavailable(_))
        ));
        assert_eq!(h.notifier.count(), 0);
    }

    #[tokio::test]
    async fn lost_create_race_becomes_already_exists() {
        let inner = Arc::new(MemoryStore::new());
        let account = AccountId::new("test-key");
        inner
            .create(
                &account,
                NewEntry {
                    word: "cat".into(),
                    created_at: NOW,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let store = RacingStore::hiding(inner, 1);
        let notifier = Arc::new(RecordingNotifier::default());
        let resolver = CaptureResolver::new(
            store,
            ScriptedPicker::choosing(None),
            notifier.clone(),
            Arc::new(FixedClock::new(NOW)),
        );

        let outcome = resolver
            .add_word(&account, "cat", &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, CaptureOutcome::AlreadyExists(e) if e.word == "cat"));
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn long_sentences_are_truncated() {
        let h = harness(ScriptedPicker::choosing(None));
        seed(&h, "cat", &[]).await;
        let text = format!("The cat {}.", "meow ".repeat(200));

        capture(&h, &text).await.unwrap();

        let stored = h.store.find_by_word(&h.account, "cat").await.unwrap().unwrap();
        assert_eq!(stored.sentences[0].chars().count(), MAX_SENTENCE_CHARS);
    }

    #[tokio::test]
    async fn refresh_replaces_enrichment_only() {
        let mut h = harness(ScriptedPicker::choosing(None));
        h.resolver = h.resolver.with_analyzer(Arc::new(StubAnalyzer));
        let seeded = seed(&h, "cat", &["The cat sat."]).await;

        let updated = h
            .resolver
            .refresh_enrichment(&h.account, &seeded.id, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.enrichment.phonetic.as_deref(), Some("/cat/"));
        assert_eq!(updated.sentences, seeded.sentences);
        assert_eq!(h.notifier.count(), 1);

        let missing = h
            .resolver
            .refresh_enrichment(&h.account, "id-ghost", &CancellationToken::new())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stored_enrichment() {
        let mut h = harness(ScriptedPicker::choosing(None));
        h.resolver = h.resolver.with_analyzer(Arc::new(FailingAnalyzer));
        let seeded = VocabularyEntry {
            id: "id-owl".into(),
            word: "owl".into(),
            enrichment: Enrichment {
                phonetic: Some("/aʊl/".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        h.store.insert(&h.account, seeded.clone()).await;

        let result = h
            .resolver
            .refresh_enrichment(&h.account, "id-owl", &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_none());
        let stored = h.store.get(&h.account, "id-owl").await.unwrap().unwrap();
        assert_eq!(stored, seeded);
        assert_eq!(h.notifier.count(), 0);
    }

    #[tokio::test]
    async fn manual_add_requires_a_single_word() {
        let h = harness(ScriptedPicker::choosing(None));

        let err = h
            .resolver
            .add_word(&h.account, "ice cream", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Validation(ValidationError::NotAWord(_))
        ));

        let outcome = h
            .resolver
            .add_word(&h.account, "Gelato", &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, CaptureOutcome::Created(e) if e.word == "gelato"));
    }

    #[tokio::test]
    async fn ellipsis_does_not_make_a_sentence() {
        let picker = ScriptedPicker::choosing(None);
        let h = harness(picker.clone());

        let outcome = capture(&h, "wait…").await.unwrap();

        let CaptureOutcome::Created(entry) = outcome else {
            panic!("expected Created, got {:?}", outcome);
        };
        assert_eq!(entry.word, "wait…");
        assert!(picker.offered().is_empty());
    }

    fn racing_resolver(
        inner: &Arc<MemoryStore>,
        hidden: usize,
        picker: Arc<dyn TokenPicker>,
        notifier: Arc<RecordingNotifier>,
    ) -> CaptureResolver {
        CaptureResolver::new(
            RacingStore::hiding(inner.clone(), hidden),
            picker,
            notifier,
            Arc::new(FixedClock::new(NOW)),
        )
    }

    #[tokio::test]
    async fn picked_word_already_stored_gets_the_sentence() {
        let inner = Arc::new(MemoryStore::new());
        let account = AccountId::new("test-key");
        inner
            .insert(
                &account,
                VocabularyEntry {
                    id: "id-sat".into(),
                    word: "sat".into(),
                    created_at: NOW - 1_000,
                    ..Default::default()
                },
            )
            .await;
        let notifier = Arc::new(RecordingNotifier::default());
        let cancel = CancellationToken::new();
        let request = CaptureRequest::manual("The cat sat.");

        // All three token lookups miss, the one after the pick finds it
        let resolver = racing_resolver(
            &inner,
            3,
            ScriptedPicker::choosing(Some("Sat")),
            notifier.clone(),
        );
        let outcome = resolver.resolve(&account, &request, &cancel).await.unwrap();

        let CaptureOutcome::SentenceAttached(entry) = outcome else {
            panic!("expected SentenceAttached, got {:?}", outcome);
        };
        assert_eq!(entry.id, "id-sat");
        assert_eq!(entry.sentences, vec!["The cat sat."]);
        assert_eq!(notifier.count(), 1);

        let resolver = racing_resolver(
            &inner,
            3,
            ScriptedPicker::choosing(Some("sat")),
            notifier.clone(),
        );
        let outcome = resolver.resolve(&account, &request, &cancel).await.unwrap();

        assert!(matches!(outcome, CaptureOutcome::SentenceDuplicate(e) if e.id == "id-sat"));
        assert_eq!(notifier.count(), 1);
        assert_eq!(inner.list_all(&account).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lost_create_race_after_pick_attaches_instead() {
        let inner = Arc::new(MemoryStore::new());
        let account = AccountId::new("test-key");
        inner
            .insert(
                &account,
                VocabularyEntry {
                    id: "id-sat".into(),
                    word: "sat".into(),
                    created_at: NOW - 1_000,
                    sentences: vec!["Older sat line.".into()],
                    ..Default::default()
                },
            )
            .await;
        let notifier = Arc::new(RecordingNotifier::default());

        // Token lookups and the post-pick lookup all miss, so create collides
        let resolver = racing_resolver(
            &inner,
            4,
            ScriptedPicker::choosing(Some("sat")),
            notifier.clone(),
        );
        let outcome = resolver
            .resolve(
                &account,
                &CaptureRequest::manual("The cat sat."),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let CaptureOutcome::SentenceAttached(entry) = outcome else {
            panic!("expected SentenceAttached, got {:?}", outcome);
        };
        assert_eq!(entry.sentences, vec!["The cat sat.", "Older sat line."]);
        assert_eq!(inner.list_all(&account).await.unwrap().len(), 1);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn cancel_during_enrichment_writes_nothing() {
        let mut h = harness(ScriptedPicker::choosing(Some("sat")));
        h.resolver = h.resolver.with_analyzer(Arc::new(StalledAnalyzer));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = h
            .resolver
            .resolve(&h.account, &CaptureRequest::manual("The cat sat."), &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, CaptureOutcome::Cancelled);
        assert!(h.store.list_all(&h.account).await.unwrap().is_empty());
        assert_eq!(h.notifier.count(), 0);
    }
}
