use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{bounded, DocumentBackend, PdfFile};
use crate::error::ChatError;
use crate::store::SessionStore;

/// The server-side identity of the document being discussed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub document_id: String,
    pub display_name: String,
}

/// Turns files into document ids and keeps the current one across restarts.
pub struct DocumentBinding {
    backend: Arc<dyn DocumentBackend>,
    store: Arc<dyn SessionStore>,
    timeout: Option<Duration>,
}

impl DocumentBinding {
    pub fn new(backend: Arc<dyn DocumentBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            backend,
            store,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    /// Send `file` to the upload endpoint and return the id it was given.
    /// Nothing is persisted.
    pub async fn upload(&self, file: &PdfFile) -> Result<String, ChatError> {
        if !file.looks_like_pdf() {
            warn!(file = %file.name, "File does not look like a PDF, uploading anyway");
        }
        let receipt = bounded(self.timeout, self.backend.upload(file)).await?;
        info!(
            doc_id = %receipt.doc_id,
            chunks = ?receipt.num_chunks,
            "Upload successful"
        );
        Ok(receipt.doc_id)
    }

    /// Rebuild a handle from stored values without asking the server.
    /// A stale id only shows up when the first question fails.
    pub fn restore(stored_id: &str, stored_name: &str) -> Option<DocumentHandle> {
        if stored_id.is_empty() || stored_name.is_empty() {
            return None;
        }
        Some(DocumentHandle {
            document_id: stored_id.to_string(),
            display_name: stored_name.to_string(),
        })
    }

    /// Upload and remember the result.
    pub async fn bind(&self, file: &PdfFile) -> Result<DocumentHandle, ChatError> {
        let document_id = self.upload(file).await?;
        self.store.save(&document_id, &file.name)?;
        Ok(DocumentHandle {
            document_id,
            display_name: file.name.clone(),
        })
    }

    pub fn resume(&self) -> Result<Option<DocumentHandle>, ChatError> {
        Ok(self
            .store
            .load()?
            .and_then(|(id, name)| Self::restore(&id, &name)))
    }

    pub fn forget(&self) -> Result<(), ChatError> {
        self.store.clear()
    }
}
