use crate::{Document, JobTicket, PiiType, PollOutcome, Span};

/// Detection status reported by the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStatus {
    Started,
    Unavailable,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Text extraction finished; detection may be running server-side.
    DocumentExtracted {
        document: Document,
        detection: DetectionStatus,
    },
    /// Open a document whose detection results are already known.
    DocumentOpened { document: Document, spans: Vec<Span> },
    /// Scheduler delivered the answer to one detection status request.
    DetectionPolled {
        ticket: JobTicket,
        outcome: PollOutcome,
    },
    /// User asked to rerun a failed detection.
    RetryDetectionClicked,
    /// User closed the document.
    DocumentDiscarded,
    /// User clicked a highlighted span.
    SpanToggled(usize),
    /// User marked a text selection as PII.
    ManualSpanRequested {
        text: String,
        pii_type: PiiType,
        offset: usize,
    },
    /// User clicked Reset to original.
    ResetClicked,
    SaveClicked,
    /// Server answered the save issued under `ticket`; `Ok` carries its
    /// message.
    SaveCompleted {
        ticket: JobTicket,
        result: Result<String, String>,
    },
    EncryptClicked,
    /// Server answered the encryption; `Ok` carries the optional key.
    EncryptCompleted {
        document_id: String,
        result: Result<Option<String>, String>,
    },
    /// Tokenized text was downloaded; `Ok` carries where it was written.
    TokenizedDownloaded(Result<String, String>),
    DecryptRequested { key: String },
    DecryptCompleted {
        document_id: String,
        result: Result<String, String>,
    },
    ExportClicked,
    /// Report was written; `Ok` carries its location.
    ExportCompleted(Result<String, String>),
    /// Redraw request from the front-end; never changes state.
    Tick,
    /// An event the session has no use for.
    NoOp,
}
