use engine_logging::engine_warn;

use crate::{CharRange, Document, Span};

/// Ordered spans of one document. A span's position is its identity for the
/// lifetime of the session; spans are only ever appended.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanSet {
    spans: Vec<Span>,
}

/// Why a detector span was dropped before first render.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    EmptyRange,
    OutOfBounds { char_len: usize },
    InvalidConfidence,
    OverlapsAccepted { accepted: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedSpan {
    /// Position in the detector's list.
    pub source_index: usize,
    pub span: Span,
    pub reason: RejectReason,
}

impl SpanSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate detector output against the document.
    ///
    /// Earlier spans in the list win overlaps. Accepted spans keep their
    /// relative order; their text is taken from the document slice and their
    /// confidence is clamped into `[0, 1]`.
    pub fn from_detected(document: &Document, detected: Vec<Span>) -> (SpanSet, Vec<RejectedSpan>) {
        let mut set = SpanSet::new();
        let mut rejected = Vec::new();
        let char_len = document.char_len();

        for (source_index, mut span) in detected.into_iter().enumerate() {
            let reason = if span.range.is_empty() {
                Some(RejectReason::EmptyRange)
            } else if span.range.end > char_len {
                Some(RejectReason::OutOfBounds { char_len })
            } else if !span.confidence.is_finite() {
                Some(RejectReason::InvalidConfidence)
            } else {
                set.find_overlap(span.range)
                    .map(|accepted| RejectReason::OverlapsAccepted { accepted })
            };

            if let Some(reason) = reason {
                engine_warn!(
                    "Dropping detected span #{} at {}: {:?}",
                    source_index,
                    span.range,
                    reason
                );
                rejected.push(RejectedSpan {
                    source_index,
                    span,
                    reason,
                });
                continue;
            }

            if let Some(slice) = document.slice(span.range) {
                if slice != span.text {
                    engine_warn!(
                        "Detected span #{} text disagrees with document at {}; using document text",
                        source_index,
                        span.range
                    );
                    span.text = slice.to_string();
                }
            }
            span.confidence = span.confidence.clamp(0.0, 1.0);
            set.spans.push(span);
        }

        (set, rejected)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Span> {
        self.spans.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter()
    }

    /// Index of the first span intersecting `range`, if any.
    pub fn find_overlap(&self, range: CharRange) -> Option<usize> {
        self.spans.iter().position(|span| span.range.overlaps(&range))
    }

    pub(crate) fn push(&mut self, span: Span) -> usize {
        self.spans.push(span);
        self.spans.len() - 1
    }
}
