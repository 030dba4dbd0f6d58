use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The entry disappeared between lookup and update
    #[error("Entry {0} no longer exists")]
    Vanished(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Selection is empty")]
    Empty,

    /// No token of ASCII letters, so `"3.14"` and `"привет"` both end here
    #[error("Selection contains no ASCII letters")]
    NoLetters,

    #[error("Not a single word: {0}")]
    NotAWord(String),
}
