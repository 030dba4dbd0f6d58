use std::fmt;

use lingo_types::{EntryId, EntryPatch, NewEntry, VocabularyEntry};

mod memory;

pub use memory::MemoryStore;

/// Account scope for every store call. Wraps the opaque API key that the
/// word store resolves to an account.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keys end up in logs, never print them whole
impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "{}***", prefix)
    }
}

/// Vocabulary lookup port, backed by the word store
#[async_trait::async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Exact match on the normalized word key. Not found is `Ok(None)`.
    async fn find_by_word(
        &self,
        account: &AccountId,
        word: &str,
    ) -> Result<Option<VocabularyEntry>, StoreError>;

    /// Fetch by id, used to re-read an entry right before mutating it
    async fn get(
        &self,
        account: &AccountId,
        id: &str,
    ) -> Result<Option<VocabularyEntry>, StoreError>;

    /// Fails with [`StoreError::DuplicateKey`] if the word already exists
    async fn create(
        &self,
        account: &AccountId,
        entry: NewEntry,
    ) -> Result<VocabularyEntry, StoreError>;

    /// Replace the fields set in `patch`. Last write wins, no merging.
    async fn update(
        &self,
        account: &AccountId,
        id: &str,
        patch: EntryPatch,
    ) -> Result<Option<VocabularyEntry>, StoreError>;

    async fn list_all(&self, account: &AccountId) -> Result<Vec<VocabularyEntry>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Word already exists: {0}")]
    DuplicateKey(String),

    #[error("Word store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data from word store: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub fn unavailable(err: impl fmt::Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Id of an entry, for log lines
pub(crate) fn describe(entry: &VocabularyEntry) -> String {
    format!("{} ({})", entry.word, entry.id)
}

pub(crate) fn new_entry_id(created_at: i64) -> EntryId {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", created_at, &random[..9])
}
