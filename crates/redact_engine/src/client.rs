use std::time::Duration;

use bytes::Bytes;
use engine_logging::engine_debug;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::types::{AuditLogsResponse, ErrorBody};
use crate::{
    AuditLogEntry, AuditQuery, ClientError, DecryptResponse, DetectionPoll, EncryptResponse,
    ExtractResponse, FailureKind, SavePayload, SaveResponse,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Calls to the document-processing service.
#[async_trait::async_trait]
pub trait SyncClient: Send + Sync {
    /// Upload a file for text extraction; detection may start server-side.
    async fn extract(&self, filename: &str, content: Vec<u8>)
        -> Result<ExtractResponse, ClientError>;

    /// One detection status request; `404` means the job is not ready yet.
    async fn fetch_detection(&self, file_id: &str) -> Result<DetectionPoll, ClientError>;

    async fn save(&self, payload: &SavePayload) -> Result<SaveResponse, ClientError>;

    async fn encrypt(&self, file_id: &str) -> Result<EncryptResponse, ClientError>;

    async fn download_tokenized(&self, file_id: &str) -> Result<Bytes, ClientError>;

    async fn decrypt(&self, file_id: &str, key: &str) -> Result<DecryptResponse, ClientError>;

    async fn audit_logs(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSyncClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestSyncClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        Url::parse(&settings.base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Transport, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::new(FailureKind::InvalidUrl, "base url cannot carry a path")
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        request.send().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl SyncClient for ReqwestSyncClient {
    async fn extract(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<ExtractResponse, ClientError> {
        let url = self.endpoint(&["extract"])?;
        engine_debug!("POST {} ({} bytes)", url.path(), content.len());
        let form = Form::new().part("file", Part::bytes(content).file_name(filename.to_string()));
        let response = self.send(self.client.post(url).multipart(form)).await?;
        let status = response.status();
        let extracted: ExtractResponse = read_json(response).await?;
        if !extracted.success {
            let message = extracted
                .message
                .unwrap_or_else(|| "text extraction failed".to_string());
            return Err(ClientError::new(
                FailureKind::ServerError(status.as_u16()),
                message,
            ));
        }
        Ok(extracted)
    }

    async fn fetch_detection(&self, file_id: &str) -> Result<DetectionPoll, ClientError> {
        let url = self.endpoint(&["document", file_id, "pii"])?;
        engine_debug!("GET {}", url.path());
        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DetectionPoll::NotReady);
        }
        read_json(response).await.map(DetectionPoll::Ready)
    }

    async fn save(&self, payload: &SavePayload) -> Result<SaveResponse, ClientError> {
        let url = self.endpoint(&["pii", "save"])?;
        engine_debug!(
            "PUT {} ({} span(s))",
            url.path(),
            payload.pii_matches.len()
        );
        let response = self.send(self.client.put(url).json(payload)).await?;
        read_json(response).await
    }

    async fn encrypt(&self, file_id: &str) -> Result<EncryptResponse, ClientError> {
        let url = self.endpoint(&["encrypt_pii"])?;
        engine_debug!("POST {}", url.path());
        let body = serde_json::json!({ "file_id": file_id });
        let response = self.send(self.client.post(url).json(&body)).await?;
        read_json(response).await
    }

    async fn download_tokenized(&self, file_id: &str) -> Result<Bytes, ClientError> {
        let mut url = self.endpoint(&["get_tokenized_text"])?;
        url.query_pairs_mut().append_pair("file_id", file_id);
        engine_debug!("GET {}", url.path());
        let response = self.send(self.client.get(url)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            return Err(server_error(status, &body));
        }

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ClientError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "tokenized text too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ClientError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "tokenized text too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(bytes))
    }

    async fn decrypt(&self, file_id: &str, key: &str) -> Result<DecryptResponse, ClientError> {
        let url = self.endpoint(&["decrypt_pii"])?;
        engine_debug!("POST {}", url.path());
        let body = serde_json::json!({ "file_id": file_id, "decryption_key": key });
        let response = self.send(self.client.post(url).json(&body)).await?;
        read_json(response).await
    }

    async fn audit_logs(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, ClientError> {
        let mut url = self.endpoint(&["audit", "logs"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(file_id) = &query.file_id {
                pairs.append_pair("file_id", file_id);
            }
            if let Some(activity_type) = &query.activity_type {
                pairs.append_pair("activity_type", activity_type);
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = query.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        engine_debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        let body: AuditLogsResponse = read_json(response).await?;
        Ok(body.logs)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(server_error(status, &body));
    }
    serde_json::from_slice(&body)
        .map_err(|err| ClientError::new(FailureKind::InvalidResponse, err.to_string()))
}

fn server_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error.or(body.message))
        .unwrap_or_else(|| status.to_string());
    ClientError::new(FailureKind::ServerError(status.as_u16()), message)
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    ClientError::new(FailureKind::Transport, err.to_string())
}
