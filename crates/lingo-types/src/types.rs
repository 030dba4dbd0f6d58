use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque entry identifier assigned by the word store
pub type EntryId = String;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Raw selection captured from a page, clipboard or socket
    Capture(CaptureRequest),
    /// Direct "add this word" action
    AddWord(String),
    ToggleReview {
        id: EntryId,
        checked: bool,
    },
    /// Vocabulary changed somewhere, open views should reload
    RefreshVocabulary,
    /// User-visible notice about the last capture
    CaptureStatus {
        message: String,
        success: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Clipboard,
    Websocket,
    Manual,
}

#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub text: String,
    pub source_url: String,
    pub source_title: String,
    pub source: TextSource,
}

impl CaptureRequest {
    /// Selection with no page information
    pub fn new(text: impl Into<String>, source: TextSource) -> Self {
        Self {
            text: text.into(),
            source_url: String::new(),
            source_title: String::new(),
            source,
        }
    }

    pub fn manual(text: impl Into<String>) -> Self {
        Self::new(text, TextSource::Manual)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub sentence: String,
    #[serde(default)]
    pub translation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<String>,
    /// Translations joined with "; "
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
}

/// Provider-supplied word data. Opaque to capture and review logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meanings: Vec<Meaning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_words: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Free text from a provider whose payload had no known shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A stored vocabulary item, scoped to one account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub id: EntryId,
    /// Normalized key: lowercase, trimmed, at most 200 chars
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_word: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Epoch milliseconds, 0 when the store never recorded it
    #[serde(default)]
    pub created_at: i64,
    #[serde(flatten)]
    pub enrichment: Enrichment,
    /// Most recent first
    #[serde(default)]
    pub sentences: Vec<String>,
    /// Markdown notes keyed by trimmed, lowercased sentence
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
    /// Epoch milliseconds of completed reviews, unsorted
    #[serde(default)]
    pub review_times: Vec<i64>,
}

/// Entry payload before the store assigns an id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_word: Option<String>,
    pub url: String,
    pub title: String,
    pub created_at: i64,
    #[serde(flatten)]
    pub enrichment: Enrichment,
    pub sentences: Vec<String>,
}

impl NewEntry {
    pub fn into_entry(self, id: EntryId) -> VocabularyEntry {
        VocabularyEntry {
            id,
            word: self.word,
            original_word: self.original_word,
            url: self.url,
            title: self.title,
            created_at: self.created_at,
            enrichment: self.enrichment,
            sentences: self.sentences,
            notes: BTreeMap::new(),
            review_times: Vec::new(),
        }
    }
}

/// Partial update. Every `Some` field replaces the stored field wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_times: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub enrichment: Option<Enrichment>,
}

impl EntryPatch {
    pub fn sentences(sentences: Vec<String>) -> Self {
        Self {
            sentences: Some(sentences),
            ..Default::default()
        }
    }

    pub fn review_times(review_times: Vec<i64>) -> Self {
        Self {
            review_times: Some(review_times),
            ..Default::default()
        }
    }

    pub fn notes(notes: BTreeMap<String, String>) -> Self {
        Self {
            notes: Some(notes),
            ..Default::default()
        }
    }

    pub fn enrichment(enrichment: Enrichment) -> Self {
        Self {
            enrichment: Some(enrichment),
            ..Default::default()
        }
    }

    pub fn apply(self, entry: &mut VocabularyEntry) {
        if let Some(sentences) = self.sentences {
            entry.sentences = sentences;
        }
        if let Some(review_times) = self.review_times {
            entry.review_times = review_times;
        }
        if let Some(notes) = self.notes {
            entry.notes = notes;
        }
        if let Some(enrichment) = self.enrichment {
            entry.enrichment = enrichment;
        }
    }
}
