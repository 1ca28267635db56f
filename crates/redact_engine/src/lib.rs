//! Redact engine: HTTP client for the document service and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod types;

pub use client::{ClientSettings, ReqwestSyncClient, SyncClient};
pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use filename::{report_filename, tokenized_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{
    AuditLogEntry, AuditQuery, ClientError, DecryptResponse, DetectionPoll, EncryptResponse,
    EngineEvent, ExtractResponse, FailureKind, JobId, PiiDetectionStatus, PiiMatch, PiiResult,
    PiiSummaryPayload, SavePayload, SaveResponse,
};
