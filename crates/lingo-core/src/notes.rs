use lingo_types::{EntryPatch, VocabularyEntry};

use crate::preprocess::sentence_key;
use crate::store::{AccountId, StoreError, VocabularyStore};

/// Note attached to `sentence`, if any
pub fn note_for<'a>(entry: &'a VocabularyEntry, sentence: &str) -> Option<&'a str> {
    entry.notes.get(&sentence_key(sentence)).map(String::as_str)
}

/// Set the Markdown note for one of an entry's sentences. A blank note
/// removes it.
///
/// Same read-modify-write as review toggling: the entry is re-read, then the
/// whole `notes` map is written back.
pub async fn set_sentence_note(
    store: &dyn VocabularyStore,
    account: &AccountId,
    id: &str,
    sentence: &str,
    markdown: &str,
) -> Result<Option<VocabularyEntry>, StoreError> {
    let Some(entry) = store.get(account, id).await? else {
        return Ok(None);
    };

    let key = sentence_key(sentence);
    let mut notes = entry.notes.clone();

    if markdown.trim().is_empty() {
        if notes.remove(&key).is_none() {
            return Ok(Some(entry));
        }
    } else {
        notes.insert(key, markdown.to_string());
    }

    tracing::debug!("Saving {} sentence notes for '{}'", notes.len(), entry.word);
    store.update(account, id, EntryPatch::notes(notes)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seeded() -> (MemoryStore, AccountId) {
        let store = MemoryStore::new();
        let account = AccountId::new("test-key");
        store
            .insert(
                &account,
                VocabularyEntry {
                    id: "1".into(),
                    word: "cat".into(),
                    sentences: vec!["The cat sat.".into()],
                    ..Default::default()
                },
            )
            .await;
        (store, account)
    }

    #[tokio::test]
    async fn note_is_keyed_by_normalized_sentence() {
        let (store, account) = seeded().await;

        let updated = set_sentence_note(&store, &account, "1", " The CAT sat. ", "*past tense*")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(note_for(&updated, "the cat sat."), Some("*past tense*"));
        assert_eq!(updated.notes.len(), 1);
    }

    #[tokio::test]
    async fn blank_note_removes_it() {
        let (store, account) = seeded().await;
        set_sentence_note(&store, &account, "1", "The cat sat.", "note")
            .await
            .unwrap();

        let updated = set_sentence_note(&store, &account, "1", "The cat sat.", "  \n")
            .await
            .unwrap()
            .unwrap();

        assert!(note_for(&updated, "The cat sat.").is_none());
        assert!(updated.notes.is_empty());
    }

    #[tokio::test]
    async fn missing_entry_is_none() {
        let (store, account) = seeded().await;
        let result = set_sentence_note(&store, &account, "404", "x", "y").await.unwrap();
        assert!(result.is_none());
    }
}
