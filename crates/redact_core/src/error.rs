use crate::CharRange;

/// Failures of local span edits. None of them mutate state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("span index {index} out of range (span count {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("selected text not found at offset {offset}")]
    NotFound { offset: usize },
    #[error("range {range} overlaps existing span {existing}")]
    Overlap { range: CharRange, existing: usize },
}
