use std::fmt::Write;

use redact_core::{
    AppViewModel, DetectionFailure, NoticeLevel, PiiType, Segment, SessionPhase,
    HIGH_CONFIDENCE_THRESHOLD,
};
use redact_engine::AuditLogEntry;

/// Full screen for the current view: document with inline span markers,
/// then summary and status.
///
/// Selected spans render as `[text]#n:TYPE`, deselected ones as
/// `(text)#n:TYPE`.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();

    let document = view.document_id.as_deref().unwrap_or("-");
    let _ = writeln!(out, "== document {document} | {} ==", phase_label(&view.phase));

    if !view.segments.is_empty() {
        out.push_str(&render_segments(&view.segments));
        out.push('\n');
    }

    let summary = &view.summary;
    let _ = writeln!(
        out,
        "-- {} of {} span(s) selected, {} high confidence (>= {:.0}%) --",
        summary.active_count,
        view.span_count,
        summary.high_confidence_count,
        HIGH_CONFIDENCE_THRESHOLD * 100.0
    );
    for (pii_type, count) in summary.types_by_count() {
        let _ = writeln!(out, "   {:<16} {count}", pii_type.label());
    }

    if view.has_unsaved_changes {
        out.push_str("* unsaved changes\n");
    }
    if view.can_encrypt {
        out.push_str("ready to encrypt: type `encrypt`\n");
    }
    if let Some(key) = &view.decryption_key {
        let _ = writeln!(out, "decryption key: {key}");
    }
    if let Some(text) = &view.decrypted_text {
        let _ = writeln!(out, "decrypted text:\n{text}");
    }
    if let Some(notice) = &view.notice {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        let _ = writeln!(out, "{prefix}: {}", notice.text);
    }
    out
}

fn render_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::PlainText { text } => out.push_str(text),
            Segment::Highlighted {
                index,
                span,
                selected,
            } => {
                let (open, close) = if *selected { ('[', ']') } else { ('(', ')') };
                let _ = write!(
                    out,
                    "{open}{}{close}#{index}:{}",
                    span.text,
                    span.pii_type.as_str().to_uppercase()
                );
            }
        }
    }
    out
}

fn phase_label(phase: &SessionPhase) -> String {
    match phase {
        SessionPhase::Empty => "no document".to_string(),
        SessionPhase::Detecting => "detecting PII".to_string(),
        SessionPhase::DetectionFailed(DetectionFailure::TimedOut { attempts }) => {
            format!("detection timed out after {attempts} attempt(s)")
        }
        SessionPhase::DetectionFailed(DetectionFailure::Error { attempts, message }) => {
            format!("detection failed after {attempts} attempt(s): {message}")
        }
        SessionPhase::Editing => "editing".to_string(),
        SessionPhase::Saving => "saving".to_string(),
        SessionPhase::Saved => "saved".to_string(),
        SessionPhase::Encrypting => "encrypting".to_string(),
        SessionPhase::Encrypted => "encrypted".to_string(),
    }
}

/// Progress line while detection runs; empty in other phases.
pub fn detection_progress(view: &AppViewModel) -> Option<String> {
    match view.phase {
        SessionPhase::Detecting => Some(format!(
            "waiting for PII detection (attempt {})",
            view.detection_attempts
        )),
        _ => None,
    }
}

pub fn pii_types() -> String {
    let mut out = String::new();
    for pii_type in PiiType::ALL {
        let _ = writeln!(out, "  {:<16} {}", pii_type.as_str(), pii_type.label());
    }
    out
}

pub fn audit_table(entries: &[AuditLogEntry]) -> String {
    if entries.is_empty() {
        return "no audit entries\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:<26} {:<22} {:<10} details", "timestamp", "activity", "file");
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<26} {:<22} {:<10} {}",
            entry.timestamp,
            entry.activity_type,
            entry.file_id.as_deref().unwrap_or("-"),
            entry.details.as_deref().unwrap_or("")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_core::{update, AppState, CharRange, Document, Msg, Span};

    #[test]
    fn selected_and_deselected_spans_are_marked_inline() {
        let (state, _) = update(
            AppState::new(),
            Msg::DocumentOpened {
                document: Document::new("file-1", "John Doe lives at 123 Main St"),
                spans: vec![
                    Span::detected("John Doe", PiiType::Name, CharRange::new(0, 8), 0.95),
                    Span::detected("123 Main St", PiiType::Address, CharRange::new(18, 29), 0.6),
                ],
            },
        );
        let (state, _) = update(state, Msg::SpanToggled(1));

        let screen = render(&state.view());

        assert!(screen.contains("[John Doe]#0:NAME lives at (123 Main St)#1:ADDRESS"));
        assert!(screen.contains("1 of 2 span(s) selected, 1 high confidence"));
        assert!(screen.contains("* unsaved changes"));
    }

    #[test]
    fn audit_rows_show_missing_ids_as_dash() {
        let entries = vec![AuditLogEntry {
            activity_type: "pii_detection".to_string(),
            file_id: None,
            timestamp: "2024-05-01T10:00:00".to_string(),
            details: Some("Detected 3 PII items".to_string()),
            metadata: None,
            user_id: None,
        }];
        let table = audit_table(&entries);
        assert!(table.lines().nth(1).unwrap().contains(" -  "));
    }
}
