use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::{DocumentBackend, PdfFile};
use crate::binding::{DocumentBinding, DocumentHandle};
use crate::error::ChatError;
use crate::session::{ConversationSession, Message};
use crate::store::SessionStore;

struct ActiveChat {
    handle: DocumentHandle,
    session: ConversationSession,
}

/// One document, one conversation: opening a new file or starting a new
/// chat throws the previous session away.
pub struct DocumentChat {
    backend: Arc<dyn DocumentBackend>,
    binding: DocumentBinding,
    timeout: Option<Duration>,
    active: Option<ActiveChat>,
}

impl DocumentChat {
    pub fn new(backend: Arc<dyn DocumentBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            binding: DocumentBinding::new(backend.clone(), store),
            backend,
            timeout: None,
            active: None,
        }
    }

    /// Bound every upload and query by `limit`.
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.binding = self.binding.with_timeout(limit);
        self.timeout = limit;
        self
    }

    fn start(&mut self, handle: DocumentHandle) -> &DocumentHandle {
        let session = ConversationSession::new(handle.document_id.clone(), self.backend.clone())
            .with_timeout(self.timeout);
        let active = self.active.insert(ActiveChat { handle, session });
        &active.handle
    }

    fn ensure_idle(&self) -> Result<(), ChatError> {
        match &self.active {
            Some(active) if active.session.is_pending() => Err(ChatError::SessionBusy),
            _ => Ok(()),
        }
    }

    /// Pick up the binding left by a previous run, if any. No network call.
    pub fn resume(&mut self) -> Result<Option<&DocumentHandle>, ChatError> {
        self.ensure_idle()?;
        match self.binding.resume()? {
            Some(handle) => {
                info!(doc_id = %handle.document_id, file = %handle.display_name, "Resumed document");
                Ok(Some(self.start(handle)))
            }
            None => Ok(None),
        }
    }

    /// Upload `file` and start a fresh conversation about it.
    pub async fn open(&mut self, file: &PdfFile) -> Result<&DocumentHandle, ChatError> {
        self.ensure_idle()?;
        self.active = None;
        let handle = self.binding.bind(file).await?;
        Ok(self.start(handle))
    }

    pub async fn ask(&self, text: impl Into<String>) -> Result<Message, ChatError> {
        self.session().ok_or(ChatError::NoDocument)?.ask(text).await
    }

    pub async fn retry(&self) -> Result<Message, ChatError> {
        self.session().ok_or(ChatError::NoDocument)?.retry().await
    }

    /// Forget the current document, both in memory and in the store.
    pub fn new_chat(&mut self) -> Result<(), ChatError> {
        self.ensure_idle()?;
        self.binding.forget()?;
        if let Some(active) = self.active.take() {
            info!(doc_id = %active.handle.document_id, "Chat reset");
        }
        Ok(())
    }

    pub fn handle(&self) -> Option<&DocumentHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }

    pub fn session(&self) -> Option<&ConversationSession> {
        self.active.as_ref().map(|a| &a.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::ScriptedBackend;

    fn chat_over(backend: &Arc<ScriptedBackend>, store: &Arc<MemoryStore>) -> DocumentChat {
        DocumentChat::new(
            backend.clone() as Arc<dyn DocumentBackend>,
            store.clone() as Arc<dyn SessionStore>,
        )
    }

    #[tokio::test]
    async fn test_ask_without_document() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());
        let chat = chat_over(&backend, &store);

        assert!(matches!(chat.ask("hi").await, Err(ChatError::NoDocument)));
        assert!(backend.queries().is_empty());
    }

    #[tokio::test]
    async fn test_open_then_ask() {
        let backend = Arc::new(ScriptedBackend::new().accept_upload("d1").answer("$42"));
        let store = Arc::new(MemoryStore::new());
        let mut chat = chat_over(&backend, &store);

        let handle = chat
            .open(&PdfFile::new("report.pdf", b"%PDF-1.4".to_vec()))
            .await
            .unwrap()
            .clone();
        assert_eq!(handle.document_id, "d1");

        chat.ask("What is the total?").await.unwrap();
        assert_eq!(
            chat.session().unwrap().messages(),
            vec![Message::user("What is the total?"), Message::model("$42")]
        );
    }

    #[tokio::test]
    async fn test_resume_uses_store_without_network() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());
        store.save("d1", "report.pdf").unwrap();
        let mut chat = chat_over(&backend, &store);

        let handle = chat.resume().unwrap().cloned();

        assert_eq!(
            handle,
            Some(DocumentHandle {
                document_id: "d1".into(),
                display_name: "report.pdf".into(),
            })
        );
        assert_eq!(chat.session().unwrap().message_count(), 0);
        assert_eq!(backend.upload_calls(), 0);
        assert!(backend.queries().is_empty());
    }

    #[tokio::test]
    async fn test_new_chat_clears_everything() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());
        store.save("d1", "report.pdf").unwrap();
        let mut chat = chat_over(&backend, &store);
        chat.resume().unwrap();

        chat.new_chat().unwrap();

        assert!(chat.handle().is_none());
        assert_eq!(store.load().unwrap(), None);
        assert!(chat.resume().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_open_leaves_chat_unbound() {
        let backend = Arc::new(ScriptedBackend::new().reject_upload(ChatError::NetworkUnavailable(
            "connection refused".into(),
        )));
        let store = Arc::new(MemoryStore::new());
        store.save("d0", "earlier.pdf").unwrap();
        let mut chat = chat_over(&backend, &store);
        chat.resume().unwrap();

        let err = chat
            .open(&PdfFile::new("report.pdf", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::NetworkUnavailable(_)));
        assert!(chat.session().is_none());
        assert_eq!(
            store.load().unwrap(),
            Some(("d0".to_string(), "earlier.pdf".to_string()))
        );
    }

    #[tokio::test]
    async fn test_slow_upload_times_out() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_delay(Duration::from_secs(5))
                .accept_upload("d1"),
        );
        let store = Arc::new(MemoryStore::new());
        let mut chat = chat_over(&backend, &store).with_timeout(Some(Duration::from_millis(20)));

        let err = chat
            .open(&PdfFile::new("report.pdf", b"%PDF-1.4".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::NetworkUnavailable(_)));
        assert_eq!(backend.upload_calls(), 1);
        assert_eq!(store.load().unwrap(), None);
        assert!(chat.handle().is_none());
    }
}
