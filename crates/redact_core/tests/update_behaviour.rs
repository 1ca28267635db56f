use std::sync::Once;

use redact_core::{
    update, AppState, CharRange, DetectionStatus, Document, Effect, JobTicket, Msg, NoticeLevel,
    PiiType, SessionPhase, Span,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

const TEXT: &str = "John Doe lives at 123 Main St";

fn opened() -> AppState {
    open(AppState::new(), "file-1")
}

fn open(state: AppState, id: &str) -> AppState {
    let (state, effects) = update(
        state,
        Msg::DocumentOpened {
            document: Document::new(id, TEXT),
            spans: vec![Span::detected(
                "John Doe",
                PiiType::Name,
                CharRange::new(0, 8),
                0.95,
            )],
        },
    );
    assert!(effects.is_empty());
    state
}

/// Click save and return the ticket the completion has to carry.
fn save_clicked(state: AppState) -> (AppState, JobTicket) {
    let (state, effects) = update(state, Msg::SaveClicked);
    match effects.as_slice() {
        [Effect::SaveSpans(request)] => {
            let ticket = request.ticket.clone();
            (state, ticket)
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

fn save_completed(state: AppState, ticket: &JobTicket, result: Result<&str, &str>) -> AppState {
    let (state, effects) = update(
        state,
        Msg::SaveCompleted {
            ticket: ticket.clone(),
            result: result.map(str::to_string).map_err(str::to_string),
        },
    );
    assert!(effects.is_empty());
    state
}

fn saved(state: AppState) -> AppState {
    let (state, ticket) = save_clicked(state);
    let state = save_completed(state, &ticket, Ok("saved"));
    assert_eq!(*state.phase(), SessionPhase::Saved);
    state
}

#[test]
fn opening_with_spans_selects_all_and_is_clean() {
    init_logging();
    let mut state = opened();
    let view = state.view();

    assert_eq!(view.phase, SessionPhase::Editing);
    assert_eq!(view.document_id.as_deref(), Some("file-1"));
    assert_eq!(view.span_count, 1);
    assert_eq!(view.summary.active_count, 1);
    assert!(!view.has_unsaved_changes);
    assert!(!view.can_encrypt);
    assert!(state.consume_view_changed());
    assert!(!state.consume_view_changed());
}

#[test]
fn deselect_then_reset_is_clean_again() {
    init_logging();
    let state = opened();
    let (state, _) = update(state, Msg::SpanToggled(0));
    assert!(state.view().has_unsaved_changes);
    assert_eq!(state.view().summary.active_count, 0);

    let (state, effects) = update(state, Msg::ResetClicked);

    assert!(effects.is_empty());
    let annotations = state.annotations().unwrap();
    assert_eq!(annotations.selection().indices().collect::<Vec<_>>(), vec![0]);
    assert!(!state.view().has_unsaved_changes);
}

#[test]
fn toggle_out_of_range_sets_error_notice_only() {
    init_logging();
    let mut state = opened();
    state.consume_view_changed();
    let before = state.annotations().cloned();

    let (mut state, effects) = update(state, Msg::SpanToggled(5));

    assert!(effects.is_empty());
    assert_eq!(state.annotations().cloned(), before);
    assert_eq!(state.notice().unwrap().level, NoticeLevel::Error);
    assert!(state.consume_view_changed());
}

#[test]
fn manual_span_is_added_and_selected() {
    init_logging();
    let state = opened();
    let (state, effects) = update(
        state,
        Msg::ManualSpanRequested {
            text: "Main St".to_string(),
            pii_type: PiiType::Address,
            offset: 22,
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.span_count, 2);
    assert_eq!(view.summary.active_count, 2);
    assert!(view.has_unsaved_changes);
    assert_eq!(view.notice.unwrap().level, NoticeLevel::Info);
}

#[test]
fn overlapping_manual_span_is_rejected_with_notice() {
    init_logging();
    let state = opened();
    let (state, _) = update(
        state,
        Msg::ManualSpanRequested {
            text: "John".to_string(),
            pii_type: PiiType::Name,
            offset: 0,
        },
    );

    let view = state.view();
    assert_eq!(view.span_count, 1);
    assert!(!view.has_unsaved_changes);
    let notice = view.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.text.contains("overlaps"));
}

#[test]
fn save_sends_selected_spans_and_commits_baseline() {
    init_logging();
    let state = opened();
    let (state, _) = update(
        state,
        Msg::ManualSpanRequested {
            text: "123 Main St".to_string(),
            pii_type: PiiType::Address,
            offset: 18,
        },
    );
    let (state, _) = update(state, Msg::SpanToggled(0));
    let (state, effects) = update(state, Msg::SaveClicked);

    let request = match effects.as_slice() {
        [Effect::SaveSpans(request)] => request.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(request.document_id, "file-1");
    assert_eq!(request.ticket.document_id, "file-1");
    assert_eq!(request.original_text, TEXT);
    assert_eq!(request.spans.len(), 1);
    assert_eq!(request.spans[0].text, "123 Main St");
    assert_eq!(request.summary.active_count, 1);
    assert_eq!(*state.phase(), SessionPhase::Saving);

    let (state, effects) = update(state, Msg::SaveClicked);
    assert!(effects.is_empty(), "second save while one is in flight");

    let state = save_completed(state, &request.ticket, Ok("PII changes saved"));
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Saved);
    assert!(!view.has_unsaved_changes);
    assert!(view.can_encrypt);
    assert_eq!(view.notice.unwrap().text, "PII changes saved");
    assert_eq!(state.annotations().unwrap().baseline().span_count, 2);
}

#[test]
fn failed_save_leaves_baseline_untouched() {
    init_logging();
    let state = opened();
    let (state, _) = update(state, Msg::SpanToggled(0));
    let baseline = state.annotations().unwrap().baseline().clone();
    let (state, ticket) = save_clicked(state);

    let state = save_completed(state, &ticket, Err("disk full"));

    assert_eq!(*state.phase(), SessionPhase::Editing);
    assert_eq!(state.annotations().unwrap().baseline(), &baseline);
    assert!(state.view().has_unsaved_changes);
    assert_eq!(state.notice().unwrap().level, NoticeLevel::Error);
}

#[test]
fn edits_during_save_stay_dirty_after_success() {
    init_logging();
    let state = opened();
    let (state, _) = update(state, Msg::SpanToggled(0));
    let (state, ticket) = save_clicked(state);
    let (state, _) = update(state, Msg::SpanToggled(0));

    let state = save_completed(state, &ticket, Ok(""));

    assert_eq!(*state.phase(), SessionPhase::Editing);
    assert!(state.view().has_unsaved_changes);
    assert!(!state.view().can_encrypt);
}

#[test]
fn dirty_edit_after_save_withdraws_encryption() {
    init_logging();
    let state = saved(opened());
    let (state, _) = update(state, Msg::SpanToggled(0));
    assert_eq!(*state.phase(), SessionPhase::Editing);
    assert!(!state.view().can_encrypt);

    let (state, effects) = update(state, Msg::EncryptClicked);
    assert!(effects.is_empty());

    // Toggling back restores the saved selection; the phase stays Editing
    // until the next save.
    let (state, _) = update(state, Msg::SpanToggled(0));
    assert!(!state.view().has_unsaved_changes);
}

#[test]
fn encrypt_then_download_tokenized() {
    init_logging();
    let state = saved(opened());
    let (state, effects) = update(state, Msg::EncryptClicked);
    assert_eq!(
        effects,
        vec![Effect::Encrypt {
            document_id: "file-1".to_string()
        }]
    );
    assert_eq!(*state.phase(), SessionPhase::Encrypting);

    let (state, effects) = update(state, Msg::SpanToggled(0));
    assert!(effects.is_empty());
    assert!(!state.view().has_unsaved_changes, "edits blocked while encrypting");

    let (state, effects) = update(
        state,
        Msg::EncryptCompleted {
            document_id: "file-1".to_string(),
            result: Ok(Some("k3y".to_string())),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::DownloadTokenized {
            document_id: "file-1".to_string()
        }]
    );
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Encrypted);
    assert_eq!(view.decryption_key.as_deref(), Some("k3y"));

    let (state, _) = update(
        state,
        Msg::TokenizedDownloaded(Ok("out/file-1_tokenized.txt".to_string())),
    );
    assert!(state.notice().unwrap().text.contains("file-1_tokenized.txt"));
}

#[test]
fn failed_encryption_returns_to_saved() {
    init_logging();
    let state = saved(opened());
    let (state, _) = update(state, Msg::EncryptClicked);
    let (state, effects) = update(
        state,
        Msg::EncryptCompleted {
            document_id: "file-1".to_string(),
            result: Err("boom".to_string()),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(*state.phase(), SessionPhase::Saved);
    assert_eq!(state.notice().unwrap().level, NoticeLevel::Error);
}

#[test]
fn decrypt_requires_key_and_stores_text() {
    init_logging();
    let state = opened();
    let (state, effects) = update(
        state,
        Msg::DecryptRequested {
            key: "  ".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.notice().unwrap().level, NoticeLevel::Error);

    let (state, effects) = update(
        state,
        Msg::DecryptRequested {
            key: " abc ".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Decrypt {
            document_id: "file-1".to_string(),
            key: "abc".to_string()
        }]
    );

    let (state, _) = update(
        state,
        Msg::DecryptCompleted {
            document_id: "file-1".to_string(),
            result: Ok(TEXT.to_string()),
        },
    );
    assert_eq!(state.view().decrypted_text.as_deref(), Some(TEXT));
}

#[test]
fn late_save_of_previous_document_does_not_mark_new_one_saved() {
    init_logging();
    let (state, first_ticket) = save_clicked(opened());
    let state = open(state, "file-2");
    let (state, _) = update(state, Msg::SpanToggled(0));
    let baseline = state.annotations().unwrap().baseline().clone();
    let (state, second_ticket) = save_clicked(state);
    assert_ne!(first_ticket, second_ticket);

    let state = save_completed(state, &first_ticket, Ok("saved A"));
    assert_eq!(*state.phase(), SessionPhase::Saving);
    assert!(state.view().has_unsaved_changes);
    assert_eq!(state.annotations().unwrap().baseline(), &baseline);

    let state = save_completed(state, &second_ticket, Err("disk full"));
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Editing);
    assert!(view.has_unsaved_changes);
    assert!(!view.can_encrypt);
    let notice = view.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.text.contains("disk full"));
    assert_eq!(state.annotations().unwrap().baseline(), &baseline);
}

#[test]
fn save_completion_after_discard_is_ignored() {
    init_logging();
    let (state, ticket) = save_clicked(opened());
    let (state, _) = update(state, Msg::DocumentDiscarded);

    let state = save_completed(state, &ticket, Ok("saved"));

    assert_eq!(*state.phase(), SessionPhase::Empty);
    assert!(state.notice().is_none());
}

#[test]
fn encryption_result_for_another_document_is_ignored() {
    init_logging();
    let state = saved(opened());
    let (state, _) = update(state, Msg::EncryptClicked);

    let (state, effects) = update(
        state,
        Msg::EncryptCompleted {
            document_id: "file-9".to_string(),
            result: Ok(Some("k3y".to_string())),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Encrypting);
    assert_eq!(view.decryption_key, None);
}

#[test]
fn decrypt_result_after_discard_is_ignored() {
    init_logging();
    let (state, effects) = update(
        opened(),
        Msg::DecryptRequested {
            key: "abc".to_string(),
        },
    );
    assert_eq!(effects.len(), 1);
    let (state, _) = update(state, Msg::DocumentDiscarded);

    let (state, effects) = update(
        state,
        Msg::DecryptCompleted {
            document_id: "file-1".to_string(),
            result: Ok("secret text".to_string()),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Empty);
    assert_eq!(view.decrypted_text, None);
}

#[test]
fn export_reports_selected_spans() {
    init_logging();
    let state = opened();
    let (state, effects) = update(state, Msg::ExportClicked);

    match effects.as_slice() {
        [Effect::ExportReport(report)] => {
            assert_eq!(report.document_id, "file-1");
            assert_eq!(report.spans.len(), 1);
            assert_eq!(report.original_text_length, 29);
        }
        other => panic!("unexpected effects {other:?}"),
    }

    let (state, _) = update(state, Msg::ExportCompleted(Err("read-only".to_string())));
    assert_eq!(state.notice().unwrap().level, NoticeLevel::Error);
}

#[test]
fn unavailable_detection_opens_for_manual_annotation() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::DocumentExtracted {
            document: Document::new("file-2", "call 555 0100"),
            detection: DetectionStatus::Unavailable,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(*state.phase(), SessionPhase::Editing);
    assert_eq!(state.view().span_count, 0);

    let (state, _) = update(
        state,
        Msg::ManualSpanRequested {
            text: "555 0100".to_string(),
            pii_type: PiiType::Phone,
            offset: 5,
        },
    );
    assert_eq!(state.view().span_count, 1);
    assert!(state.view().has_unsaved_changes);
}
