use std::time::Duration;

use crate::{JobTicket, PiiSummary, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PollDetection { ticket: JobTicket, delay: Duration },
    CancelDetection { ticket: JobTicket },
    SaveSpans(SaveRequest),
    Encrypt { document_id: String },
    DownloadTokenized { document_id: String },
    Decrypt { document_id: String, key: String },
    ExportReport(ReportSnapshot),
}

/// Selected spans sent to the server; on success they become the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Echoed back in `Msg::SaveCompleted`.
    pub ticket: JobTicket,
    pub document_id: String,
    pub spans: Vec<Span>,
    pub summary: PiiSummary,
    pub original_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSnapshot {
    pub document_id: String,
    pub spans: Vec<Span>,
    pub summary: PiiSummary,
    pub original_text_length: usize,
}
