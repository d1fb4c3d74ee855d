use serde::Serialize;

/// Every failure the document chat can surface to a caller.
///
/// All variants are recoverable: a failed operation leaves the binding and the
/// conversation history intact and the session ready for another turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    NetworkUnavailable(String),
    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },
    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },
    #[error("Invalid server response: {0}")]
    InvalidServerResponse(String),
    #[error("Session is busy with another request")]
    SessionBusy,
    #[error("Question is empty")]
    EmptyQuestion,
    #[error("No unanswered question to retry")]
    NothingToRetry,
    #[error("No document is loaded")]
    NoDocument,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// The server-provided (or status-derived) reason of an HTTP failure.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ChatError::UploadFailed { reason } | ChatError::QueryFailed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ChatError {
    fn from(err: rusqlite::Error) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl Serialize for ChatError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
