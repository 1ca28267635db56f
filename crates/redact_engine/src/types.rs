use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

/// Scheduler-side identity of a detection job (the session generation).
pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiDetectionStatus {
    Started,
    Unavailable,
    NotApplicable,
    #[serde(other)]
    Unknown,
}

/// `POST /extract` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub text: String,
    pub filename: Option<String>,
    pub file_type: Option<String>,
    pub extraction_method: Option<String>,
    pub character_count: Option<u64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub file_id: Option<String>,
    pub pii_detection_status: Option<PiiDetectionStatus>,
    pub message: Option<String>,
}

/// One span on the wire; offsets count Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiMatch {
    pub text: String,
    #[serde(rename = "type")]
    pub pii_type: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub confidence: f32,
}

/// `GET /document/{id}/pii` success body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PiiResult {
    #[serde(default)]
    pub pii_matches: Vec<PiiMatch>,
    pub processing_duration: Option<f64>,
    pub processing_timestamp: Option<String>,
    pub model_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionPoll {
    Ready(PiiResult),
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PiiSummaryPayload {
    pub total_pii_found: usize,
    pub high_confidence_count: usize,
    pub pii_types: BTreeMap<String, usize>,
}

/// `PUT /pii/save` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavePayload {
    pub file_id: String,
    pub pii_matches: Vec<PiiMatch>,
    pub pii_summary: PiiSummaryPayload,
    pub original_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveResponse {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EncryptResponse {
    pub decryption_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecryptResponse {
    pub decrypted_text: String,
    pub text_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditQuery {
    pub file_id: Option<String>,
    pub activity_type: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditLogEntry {
    pub activity_type: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub file_id: Option<String>,
    pub timestamp: String,
    pub details: Option<String>,
    pub metadata: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "optional_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuditLogsResponse {
    #[serde(default)]
    pub logs: Vec<AuditLogEntry>,
}

/// Error body returned by the service on failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Extracted {
        result: Result<ExtractResponse, ClientError>,
    },
    DetectionPolled {
        job_id: JobId,
        file_id: String,
        result: Result<DetectionPoll, ClientError>,
    },
    Saved {
        request_id: JobId,
        file_id: String,
        result: Result<SaveResponse, ClientError>,
    },
    Encrypted {
        file_id: String,
        result: Result<EncryptResponse, ClientError>,
    },
    TokenizedDownloaded {
        file_id: String,
        result: Result<Bytes, ClientError>,
    },
    Decrypted {
        file_id: String,
        result: Result<DecryptResponse, ClientError>,
    },
    AuditLogsFetched {
        result: Result<Vec<AuditLogEntry>, ClientError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Transport,
    Timeout,
    ServerError(u16),
    InvalidResponse,
    TooLarge { max_bytes: u64, actual: Option<u64> },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Transport => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::ServerError(code) => write!(f, "server error {code}"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
        }
    }
}

/// Ids arrive as strings or as integer row ids depending on the endpoint.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(i64),
    }

    Ok(
        Option::<IdRepr>::deserialize(deserializer)?.map(|id| match id {
            IdRepr::Text(text) => text,
            IdRepr::Number(number) => number.to_string(),
        }),
    )
}
