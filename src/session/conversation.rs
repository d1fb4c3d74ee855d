//! A conversation about one uploaded document.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info_span, warn, Instrument};

use crate::api::{bounded, DocumentBackend};
use crate::error::ChatError;

use super::types::{BusyGuard, Message, Role, SessionView};

/// Ordered question/answer history bound to a single document id.
///
/// At most one turn is in flight at a time: a second `ask` while one is
/// outstanding fails with `SessionBusy` instead of queueing.
pub struct ConversationSession {
    document_id: String,
    backend: Arc<dyn DocumentBackend>,
    timeout: Option<Duration>,
    history: Mutex<Vec<Message>>,
    pending: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl ConversationSession {
    pub fn new(document_id: impl Into<String>, backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            document_id: document_id.into(),
            backend,
            timeout: None,
            history: Mutex::new(Vec::new()),
            pending: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Ask one question about the document.
    ///
    /// The question is in history before the request goes out, so a failed
    /// turn stays visible as an unanswered user message.
    pub async fn ask(&self, user_text: impl Into<String>) -> Result<Message, ChatError> {
        let text = user_text.into();
        if text.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let _guard = BusyGuard::acquire(&self.pending)?;
        self.history().push(Message::user(text.clone()));
        self.record_error(None);

        self.exchange(&text).await
    }

    /// Re-send the last question if it went unanswered, without adding a
    /// second copy of it to history.
    pub async fn retry(&self) -> Result<Message, ChatError> {
        let _guard = BusyGuard::acquire(&self.pending)?;
        let question = match self.history().last() {
            Some(last) if last.role == Role::User => last.text.clone(),
            _ => return Err(ChatError::NothingToRetry),
        };
        self.record_error(None);

        self.exchange(&question).await
    }

    async fn exchange(&self, question: &str) -> Result<Message, ChatError> {
        let turn = uuid::Uuid::new_v4();
        let span = info_span!("turn", %turn, doc_id = %self.document_id);

        async {
            let started = Instant::now();
            let call = self.backend.query(question, &self.document_id);
            match bounded(self.timeout, call).await {
                Ok(answer) => {
                    debug!(
                        sources = answer.source_chunks.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Answer received"
                    );
                    let message = Message::model(answer.answer);
                    self.history().push(message.clone());
                    Ok(message)
                }
                Err(err) => {
                    warn!(error = %err, "Turn failed");
                    self.record_error(Some(err.to_string()));
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    fn history(&self) -> MutexGuard<'_, Vec<Message>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_error(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    pub fn messages(&self) -> Vec<Message> {
        self.history().clone()
    }

    pub fn message_count(&self) -> usize {
        self.history().len()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            history: self.messages(),
            pending: self.is_pending(),
            last_error: self.last_error(),
        }
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("document_id", &self.document_id)
            .field("messages", &self.message_count())
            .field("pending", &self.is_pending())
            .finish()
    }
}
