//! In-process backend with scripted replies for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{Answer, DocumentBackend, PdfFile, QueryRequest, UploadReceipt};
use crate::error::ChatError;

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    uploads: Mutex<VecDeque<Result<UploadReceipt, ChatError>>>,
    answers: Mutex<VecDeque<Result<Answer, ChatError>>>,
    delay: Option<Duration>,
    queries: Mutex<Vec<QueryRequest>>,
    upload_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn answer(self, text: &str) -> Self {
        self.answers.lock().unwrap().push_back(Ok(Answer {
            answer: text.to_string(),
            source_chunks: vec!["chunk".to_string()],
        }));
        self
    }

    pub(crate) fn fail(self, err: ChatError) -> Self {
        self.answers.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn accept_upload(self, doc_id: &str) -> Self {
        self.uploads.lock().unwrap().push_back(Ok(UploadReceipt {
            doc_id: doc_id.to_string(),
            message: None,
            num_chunks: Some(3),
        }));
        self
    }

    pub(crate) fn reject_upload(self, err: ChatError) -> Self {
        self.uploads.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn queries(&self) -> Vec<QueryRequest> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentBackend for ScriptedBackend {
    async fn upload(&self, _file: &PdfFile) -> Result<UploadReceipt, ChatError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.uploads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(ChatError::UploadFailed {
                reason: "unscripted upload".into(),
            })
        })
    }

    async fn query(&self, query: &str, doc_id: &str) -> Result<Answer, ChatError> {
        self.queries.lock().unwrap().push(QueryRequest {
            query: query.to_string(),
            doc_id: doc_id.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.answers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(ChatError::QueryFailed {
                reason: "unscripted query".into(),
            })
        })
    }
}
