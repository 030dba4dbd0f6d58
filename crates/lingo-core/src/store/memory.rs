use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use lingo_types::{EntryPatch, NewEntry, VocabularyEntry};
use tokio::sync::RwLock;

use super::{AccountId, StoreError, VocabularyStore, new_entry_id};

/// In-process word store. Backs `--memory` runs and the test suites.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<AccountId, Vec<VocabularyEntry>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with existing entries
    pub async fn insert(&self, account: &AccountId, entry: VocabularyEntry) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(account.clone()).or_default().push(entry);
    }

    /// Simulate an outage: every call fails with `Unavailable` until reset
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VocabularyStore for MemoryStore {
    async fn find_by_word(
        &self,
        account: &AccountId,
        word: &str,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        self.check_online()?;
        let accounts = self.accounts.read().await;

        Ok(accounts
            .get(account)
            .and_then(|entries| entries.iter().find(|e| e.word == word))
            .cloned())
    }

    async fn get(
        &self,
        account: &AccountId,
        id: &str,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        self.check_online()?;
        let accounts = self.accounts.read().await;

        Ok(accounts
            .get(account)
            .and_then(|entries| entries.iter().find(|e| e.id == id))
            .cloned())
    }

    async fn create(
        &self,
        account: &AccountId,
        entry: NewEntry,
    ) -> Result<VocabularyEntry, StoreError> {
        self.check_online()?;
        let mut accounts = self.accounts.write().await;
        let entries = accounts.entry(account.clone()).or_default();

        if entries.iter().any(|e| e.word == entry.word) {
            return Err(StoreError::DuplicateKey(entry.word));
        }

        let id = new_entry_id(entry.created_at);
        let created = entry.into_entry(id);
        entries.push(created.clone());

        Ok(created)
    }

    async fn update(
        &self,
        account: &AccountId,
        id: &str,
        patch: EntryPatch,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        self.check_online()?;
        let mut accounts = self.accounts.write().await;

        let Some(entry) = accounts
            .get_mut(account)
            .and_then(|entries| entries.iter_mut().find(|e| e.id == id))
        else {
            return Ok(None);
        };

        patch.apply(entry);
        Ok(Some(entry.clone()))
    }

    async fn list_all(&self, account: &AccountId) -> Result<Vec<VocabularyEntry>, StoreError> {
        self.check_online()?;
        let accounts = self.accounts.read().await;

        Ok(accounts.get(account).cloned().unwrap_or_default())
    }
}
