use std::collections::BTreeMap;

use crate::{PiiType, SelectionState, SpanSet};

/// Aggregates over the selected spans. Always recomputed from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PiiSummary {
    pub active_count: usize,
    pub high_confidence_count: usize,
    pub per_type: BTreeMap<PiiType, usize>,
}

impl PiiSummary {
    pub fn compute(spans: &SpanSet, selection: &SelectionState) -> Self {
        let mut summary = PiiSummary::default();
        for span in selection.indices().filter_map(|index| spans.get(index)) {
            summary.active_count += 1;
            if span.is_high_confidence() {
                summary.high_confidence_count += 1;
            }
            *summary.per_type.entry(span.pii_type).or_insert(0) += 1;
        }
        summary
    }

    /// Per-type counts, largest first; ties keep type order.
    pub fn types_by_count(&self) -> Vec<(PiiType, usize)> {
        let mut types: Vec<_> = self.per_type.iter().map(|(ty, n)| (*ty, *n)).collect();
        types.sort_by(|a, b| b.1.cmp(&a.1));
        types
    }
}
