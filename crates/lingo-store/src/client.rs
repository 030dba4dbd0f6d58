use anyhow::{Context, Result};
use async_trait::async_trait;
use lingo_core::store::{AccountId, StoreError, VocabularyStore};
use lingo_types::{EntryPatch, NewEntry, VocabularyEntry};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Word store client for the `/api/words` REST surface
#[derive(Clone)]
pub struct HttpWordStore {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpWordStore {
    /// `endpoint` is the full words URL, e.g. `http://localhost:3000/api/words`
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Check the store is reachable and the key is accepted
    pub async fn check_connection(&self, account: &AccountId) -> Result<usize> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(API_KEY_HEADER, account.as_str())
            .send()
            .await
            .context("Failed to reach word store")?;

        let list: WordList = response
            .error_for_status()
            .context("Word store rejected the request")?
            .json()
            .await
            .context("Failed to parse word store response")?;

        Ok(list.count.unwrap_or(list.words.len()))
    }

    async fn fetch_one(
        &self,
        account: &AccountId,
        query: (&str, &str),
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(API_KEY_HEADER, account.as_str())
            .query(&[query])
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        read_body(response).await.map(Some)
    }
}

const API_KEY_HEADER: &str = "X-API-Key";

#[async_trait]
impl VocabularyStore for HttpWordStore {
    async fn find_by_word(
        &self,
        account: &AccountId,
        word: &str,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        self.fetch_one(account, ("word", word)).await
    }

    async fn get(
        &self,
        account: &AccountId,
        id: &str,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        self.fetch_one(account, ("id", id)).await
    }

    async fn create(
        &self,
        account: &AccountId,
        entry: NewEntry,
    ) -> Result<VocabularyEntry, StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, account.as_str())
            .json(&entry)
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::DuplicateKey(entry.word));
        }

        read_body(response).await
    }

    async fn update(
        &self,
        account: &AccountId,
        id: &str,
        patch: EntryPatch,
    ) -> Result<Option<VocabularyEntry>, StoreError> {
        let response = self
            .client
            .put(&self.endpoint)
            .header(API_KEY_HEADER, account.as_str())
            .json(&UpdateRequest { id, patch: &patch })
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        read_body(response).await.map(Some)
    }

    async fn list_all(&self, account: &AccountId) -> Result<Vec<VocabularyEntry>, StoreError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(API_KEY_HEADER, account.as_str())
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        let list: WordList = read_body(response).await?;
        tracing::debug!("Fetched {} words for {}", list.words.len(), account);

        Ok(list.words)
    }
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    id: &'a str,
    #[serde(flatten)]
    patch: &'a EntryPatch,
}

#[derive(Deserialize)]
struct WordList {
    #[serde(default)]
    words: Vec<VocabularyEntry>,
    count: Option<usize>,
}

/// Map non-success statuses, then decode the body
async fn read_body<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    if let Some(err) = status_error(response.status()) {
        return Err(err);
    }

    let bytes = response.bytes().await.map_err(StoreError::unavailable)?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn status_error(status: StatusCode) -> Option<StoreError> {
    if status.is_success() {
        return None;
    }

    let reason = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "API key rejected".to_string(),
        _ => format!("HTTP {}", status),
    };

    Some(StoreError::Unavailable(reason))
}
