use std::collections::BTreeSet;

/// Span indices currently active for redaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    active: BTreeSet<usize>,
}

impl SelectionState {
    pub fn all(span_count: usize) -> Self {
        Self {
            active: (0..span_count).collect(),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.active.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Ascending indices.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.iter().copied()
    }

    /// Flip membership; returns whether the index is now selected.
    pub(crate) fn flip(&mut self, index: usize) -> bool {
        if self.active.remove(&index) {
            false
        } else {
            self.active.insert(index);
            true
        }
    }

    pub(crate) fn insert(&mut self, index: usize) {
        self.active.insert(index);
    }
}

/// Selection and span count last confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Baseline {
    pub selection: SelectionState,
    pub span_count: usize,
}
