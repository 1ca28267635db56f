use crate::{Baseline, Document, EditError, PiiSummary, SelectionState, Span, SpanSet};

/// One document's spans, selection and server baseline.
///
/// All mutation goes through `toggle`, `insert_manual`, `reset_to_original`
/// and `commit_baseline`; aggregates are derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotations {
    document: Document,
    spans: SpanSet,
    selection: SelectionState,
    baseline: Baseline,
}

impl Annotations {
    /// Select every span and take that selection as the baseline.
    pub fn initialize(document: Document, spans: SpanSet) -> Self {
        let selection = SelectionState::all(spans.len());
        let baseline = Baseline {
            selection: selection.clone(),
            span_count: spans.len(),
        };
        Self {
            document,
            spans,
            selection,
            baseline,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn spans(&self) -> &SpanSet {
        &self.spans
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Flip membership of `index`; returns whether it is now selected.
    pub fn toggle(&mut self, index: usize) -> Result<bool, EditError> {
        if index >= self.spans.len() {
            return Err(EditError::IndexOutOfRange {
                index,
                len: self.spans.len(),
            });
        }
        Ok(self.selection.flip(index))
    }

    pub fn is_dirty(&self) -> bool {
        self.selection != self.baseline.selection || self.spans.len() != self.baseline.span_count
    }

    pub fn reset_to_original(&mut self) {
        self.selection = SelectionState::all(self.spans.len());
    }

    /// Snapshot to install as the baseline once a save of the current state
    /// succeeds.
    pub fn baseline_candidate(&self) -> Baseline {
        Baseline {
            selection: self.selection.clone(),
            span_count: self.spans.len(),
        }
    }

    pub fn commit_baseline(&mut self, baseline: Baseline) {
        self.baseline = baseline;
    }

    /// Active spans in index order.
    pub fn selected_spans(&self) -> Vec<Span> {
        self.selection
            .indices()
            .filter_map(|index| self.spans.get(index))
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> PiiSummary {
        PiiSummary::compute(&self.spans, &self.selection)
    }

    pub(crate) fn spans_mut(&mut self) -> &mut SpanSet {
        &mut self.spans
    }

    pub(crate) fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }
}
