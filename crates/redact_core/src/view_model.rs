use crate::state::{Notice, SessionPhase};
use crate::{PiiSummary, Segment};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: SessionPhase,
    pub document_id: Option<String>,
    pub segments: Vec<Segment>,
    pub span_count: usize,
    pub summary: PiiSummary,
    pub has_unsaved_changes: bool,
    pub can_encrypt: bool,
    pub detection_attempts: u32,
    pub decryption_key: Option<String>,
    pub decrypted_text: Option<String>,
    pub notice: Option<Notice>,
}
