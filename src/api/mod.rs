pub mod config;
pub mod http;

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

pub use config::ApiConfig;
pub use http::HttpBackend;

/// A file about to be sent to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ChatError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        let bytes = std::fs::read(path)?;
        Ok(Self { name, bytes })
    }

    /// Cheap local hint only; the server decides what it accepts.
    pub fn looks_like_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF-") || self.name.to_lowercase().ends_with(".pdf")
    }
}

/// What the upload endpoint reports for an accepted document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub doc_id: String,
    pub message: Option<String>,
    pub num_chunks: Option<u64>,
}

/// What the query endpoint returns for one question.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub source_chunks: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub doc_id: String,
}

/// The two opaque operations of the remote document service.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn upload(&self, file: &PdfFile) -> Result<UploadReceipt, ChatError>;

    async fn query(&self, query: &str, doc_id: &str) -> Result<Answer, ChatError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Reason string for a non-2xx response: the body's `detail` when present,
/// `HTTP {status}: {statusText}` otherwise.
pub fn error_reason(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);
    match detail {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            match status.canonical_reason() {
                Some(text) => format!("HTTP {}: {}", status.as_u16(), text),
                None => format!("HTTP {}", status.as_u16()),
            }
        }
        Some(other) => other.to_string(),
    }
}

/// Runs `call`, failing with `NetworkUnavailable` if it outlives `limit`.
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, call: F) -> Result<T, ChatError>
where
    F: Future<Output = Result<T, ChatError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            ChatError::NetworkUnavailable(format!(
                "no response within {} ms",
                limit.as_millis()
            ))
        })?,
        None => call.await,
    }
}
