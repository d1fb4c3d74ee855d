//! Durable storage for the current document binding.
//!
//! The binding is a pair of values, the server's document id and the
//! original file name. Implementations write and clear both together; a
//! half-written pair is never reported by `load`.

pub mod sqlite;

use std::sync::{Mutex, PoisonError};

use crate::error::ChatError;

pub use sqlite::SqliteStore;

pub const DOC_ID_KEY: &str = "doc_id";
pub const FILE_NAME_KEY: &str = "file_name";

pub trait SessionStore: Send + Sync {
    /// `(document_id, display_name)` if both were stored.
    fn load(&self) -> Result<Option<(String, String)>, ChatError>;

    fn save(&self, doc_id: &str, display_name: &str) -> Result<(), ChatError>;

    fn clear(&self) -> Result<(), ChatError>;
}

/// Process-lifetime store, for tests and callers that do not need restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<(String, String)>, ChatError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, doc_id: &str, display_name: &str) -> Result<(), ChatError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((doc_id.to_string(), display_name.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), ChatError> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
