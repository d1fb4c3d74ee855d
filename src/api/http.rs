use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::{error_reason, Answer, ApiConfig, DocumentBackend, PdfFile, QueryRequest, UploadReceipt};
use crate::error::ChatError;

#[derive(Deserialize)]
struct UploadResponse {
    doc_id: Option<String>,
    message: Option<String>,
    num_chunks: Option<u64>,
}

#[derive(Deserialize)]
struct QueryResponse {
    answer: Option<String>,
    #[serde(default)]
    source_chunks: Vec<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    message: Option<String>,
}

/// `DocumentBackend` speaking the service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: ApiConfig,
    http: Client,
}

impl HttpBackend {
    pub fn new(config: ApiConfig) -> Result<Self, ChatError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `GET /`: the service's greeting, used to check it is reachable.
    pub async fn health(&self) -> Result<String, ChatError> {
        let resp = self
            .http
            .get(self.config.endpoint("/"))
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(ChatError::QueryFailed {
                reason: failure_reason(resp).await,
            });
        }

        let data: HealthResponse = resp.json().await.map_err(undecodable)?;
        Ok(data.message.unwrap_or_default())
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn upload(&self, file: &PdfFile) -> Result<UploadReceipt, ChatError> {
        let url = self.config.endpoint("/upload");
        debug!(%url, file = %file.name, size = file.bytes.len(), "Uploading document");

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/pdf")
            .map_err(|e| ChatError::Config(e.to_string()))?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(ChatError::UploadFailed {
                reason: failure_reason(resp).await,
            });
        }

        let data: UploadResponse = resp.json().await.map_err(undecodable)?;
        let doc_id = data
            .doc_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ChatError::InvalidServerResponse("Server did not return a document ID".into())
            })?;

        Ok(UploadReceipt {
            doc_id,
            message: data.message,
            num_chunks: data.num_chunks,
        })
    }

    async fn query(&self, query: &str, doc_id: &str) -> Result<Answer, ChatError> {
        let url = self.config.endpoint("/query");
        debug!(%url, %doc_id, "Querying document");

        let body = QueryRequest {
            query: query.to_string(),
            doc_id: doc_id.to_string(),
        };

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(ChatError::QueryFailed {
                reason: failure_reason(resp).await,
            });
        }

        let data: QueryResponse = resp.json().await.map_err(undecodable)?;
        let answer = data.answer.ok_or_else(|| {
            ChatError::InvalidServerResponse("Server did not return an answer".into())
        })?;

        Ok(Answer {
            answer,
            source_chunks: data.source_chunks,
        })
    }
}

async fn failure_reason(resp: Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    error_reason(status, &text)
}

fn transport(err: reqwest::Error) -> ChatError {
    ChatError::NetworkUnavailable(err.to_string())
}

fn undecodable(err: reqwest::Error) -> ChatError {
    if err.is_decode() {
        ChatError::InvalidServerResponse(err.to_string())
    } else {
        // Connection dropped while the body was streaming in.
        ChatError::NetworkUnavailable(err.to_string())
    }
}
