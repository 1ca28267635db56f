use crate::{CharRange, Document, SelectionState, Span, SpanSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    PlainText {
        text: String,
    },
    Highlighted {
        index: usize,
        span: Span,
        selected: bool,
    },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::PlainText { text } => text,
            Segment::Highlighted { span, .. } => &span.text,
        }
    }
}

/// Project the document into plain and highlighted segments.
///
/// Spans must not overlap. Highlighted text is the document slice, so the
/// segment texts concatenate back to the document.
pub fn render(document: &Document, spans: &SpanSet, selection: &SelectionState) -> Vec<Segment> {
    let mut ordered: Vec<(usize, &Span)> = spans.iter().enumerate().collect();
    ordered.sort_by_key(|(index, span)| (span.range.start, *index));

    let mut segments = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut cursor = 0;
    for (index, span) in ordered {
        // Overlapping or out-of-bounds spans violate the precondition; skip them
        // rather than emit text twice.
        let Some(text) = document.slice(span.range) else {
            continue;
        };
        if span.range.start < cursor {
            continue;
        }
        push_plain(&mut segments, document, CharRange::new(cursor, span.range.start));
        let mut span = span.clone();
        span.text = text.to_string();
        cursor = span.range.end;
        segments.push(Segment::Highlighted {
            index,
            span,
            selected: selection.contains(index),
        });
    }
    push_plain(&mut segments, document, CharRange::new(cursor, document.char_len()));
    segments
}

fn push_plain(segments: &mut Vec<Segment>, document: &Document, range: CharRange) {
    if range.is_empty() {
        return;
    }
    if let Some(text) = document.slice(range) {
        segments.push(Segment::PlainText {
            text: text.to_string(),
        });
    }
}
