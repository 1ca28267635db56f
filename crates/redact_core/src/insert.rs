use engine_logging::engine_debug;

use crate::{Annotations, CharRange, EditError, Origin, PiiType, Span, MANUAL_CONFIDENCE};

impl Annotations {
    /// Append a user-selected span at the exact char offset captured when the
    /// text was selected, and select it.
    ///
    /// Fails with `NotFound` when the document does not contain
    /// `selected_text` at `offset`, and with `Overlap` when the range
    /// intersects any existing span. Nothing is mutated on failure.
    pub fn insert_manual(
        &mut self,
        selected_text: &str,
        pii_type: PiiType,
        offset: usize,
    ) -> Result<usize, EditError> {
        let end = offset
            .checked_add(selected_text.chars().count())
            .ok_or(EditError::NotFound { offset })?;
        let range = CharRange::new(offset, end);
        if range.is_empty() {
            return Err(EditError::NotFound { offset });
        }
        match self.document().slice(range) {
            Some(found) if found == selected_text => {}
            _ => return Err(EditError::NotFound { offset }),
        }
        if let Some(existing) = self.spans().find_overlap(range) {
            return Err(EditError::Overlap { range, existing });
        }

        let index = self.spans_mut().push(Span {
            text: selected_text.to_string(),
            pii_type,
            range,
            confidence: MANUAL_CONFIDENCE,
            origin: Origin::Manual,
        });
        self.selection_mut().insert(index);
        engine_debug!("Inserted manual span #{} {} as {}", index, range, pii_type);
        Ok(index)
    }
}
