use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::state::{DetectionFailure, Notice, SessionPhase};
use crate::{
    AppState, DetectionStatus, EditError, Effect, JobTicket, Msg, PollStep, ReportSnapshot,
    SaveRequest, SpanSet,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::DocumentExtracted {
            document,
            detection,
        } => {
            engine_info!(
                "Document {} opened ({} chars, detection {:?})",
                document.id(),
                document.char_len(),
                detection
            );
            let mut effects = cancel(state.open_document(document, SpanSet::new()));
            match detection {
                DetectionStatus::Started => effects.extend(start_detection(&mut state)),
                DetectionStatus::Unavailable => {
                    state.set_phase(SessionPhase::Editing);
                    state.set_notice(Notice::info(
                        "PII detection is unavailable; mark sensitive text manually.",
                    ));
                }
                DetectionStatus::NotApplicable => state.set_phase(SessionPhase::Editing),
            }
            effects
        }
        Msg::DocumentOpened { document, spans } => {
            let effects = cancel(state.open_document(document, SpanSet::new()));
            load_detected(&mut state, spans);
            effects
        }
        Msg::DetectionPolled { ticket, outcome } => {
            match state.advance_detection(&ticket, outcome) {
                PollStep::Stale => Vec::new(),
                PollStep::PollAfter(delay) => {
                    state.mark_view_changed();
                    vec![Effect::PollDetection { ticket, delay }]
                }
                PollStep::Completed(spans) => {
                    load_detected(&mut state, spans);
                    Vec::new()
                }
                PollStep::TimedOut { attempts } => {
                    state.set_phase(SessionPhase::DetectionFailed(DetectionFailure::TimedOut {
                        attempts,
                    }));
                    state.set_notice(Notice::error(
                        "PII detection did not finish in time. Retry to poll again.",
                    ));
                    Vec::new()
                }
                PollStep::Failed { attempts, message } => {
                    state.set_notice(Notice::error(format!(
                        "PII detection failed: {message}"
                    )));
                    state.set_phase(SessionPhase::DetectionFailed(DetectionFailure::Error {
                        attempts,
                        message,
                    }));
                    Vec::new()
                }
            }
        }
        Msg::RetryDetectionClicked => {
            if matches!(state.phase(), SessionPhase::DetectionFailed(_)) {
                start_detection(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::DocumentDiscarded => cancel(state.discard_document()),
        Msg::SpanToggled(index) => {
            if state.phase().accepts_edits() {
                let result = state.annotations_mut().map(|a| a.toggle(index));
                if let Some(result) = result {
                    match result {
                        Ok(selected) => {
                            engine_debug!("Span #{} selected={}", index, selected);
                            after_edit(&mut state);
                        }
                        Err(err) => reject_edit(&mut state, err),
                    }
                }
            }
            Vec::new()
        }
        Msg::ManualSpanRequested {
            text,
            pii_type,
            offset,
        } => {
            if state.phase().accepts_edits() {
                let result = state
                    .annotations_mut()
                    .map(|a| a.insert_manual(&text, pii_type, offset));
                if let Some(result) = result {
                    match result {
                        Ok(index) => {
                            state.set_notice(Notice::info(format!(
                                "Added {} span #{}.",
                                pii_type.label(),
                                index
                            )));
                            after_edit(&mut state);
                        }
                        Err(err) => reject_edit(&mut state, err),
                    }
                }
            }
            Vec::new()
        }
        Msg::ResetClicked => {
            if state.phase().accepts_edits() {
                if let Some(annotations) = state.annotations_mut() {
                    annotations.reset_to_original();
                    after_edit(&mut state);
                }
            }
            Vec::new()
        }
        Msg::SaveClicked => {
            if !state.phase().accepts_save() {
                engine_debug!("Save ignored in phase {:?}", state.phase());
                return (state, Vec::new());
            }
            let Some(ticket) = state.begin_save() else {
                return (state, Vec::new());
            };
            match state.annotations() {
                Some(annotations) => {
                    let request = SaveRequest {
                        ticket,
                        document_id: annotations.document().id().to_string(),
                        spans: annotations.selected_spans(),
                        summary: annotations.summary(),
                        original_text: annotations.document().text().to_string(),
                    };
                    engine_info!(
                        "Saving {} selected span(s) for {}",
                        request.spans.len(),
                        request.ticket
                    );
                    vec![Effect::SaveSpans(request)]
                }
                None => Vec::new(),
            }
        }
        Msg::SaveCompleted { ticket, result } => {
            let Some(baseline) = state.finish_save(&ticket) else {
                engine_debug!("Save completion for {} is stale; ignored", ticket);
                return (state, Vec::new());
            };
            match result {
                Ok(message) => {
                    let mut dirty = false;
                    if let Some(annotations) = state.annotations_mut() {
                        annotations.commit_baseline(baseline);
                        dirty = annotations.is_dirty();
                    }
                    state.set_phase(if dirty {
                        SessionPhase::Editing
                    } else {
                        SessionPhase::Saved
                    });
                    state.set_notice(Notice::info(if message.is_empty() {
                        "PII changes saved.".to_string()
                    } else {
                        message
                    }));
                }
                Err(message) => {
                    engine_warn!("Save failed: {}", message);
                    state.set_phase(SessionPhase::Editing);
                    state.set_notice(Notice::error(format!("Failed to save changes: {message}")));
                }
            }
            Vec::new()
        }
        Msg::EncryptClicked => {
            if !state.phase().can_encrypt() {
                return (state, Vec::new());
            }
            match state.document_id().map(str::to_string) {
                Some(document_id) => {
                    state.set_phase(SessionPhase::Encrypting);
                    vec![Effect::Encrypt { document_id }]
                }
                None => Vec::new(),
            }
        }
        Msg::EncryptCompleted {
            document_id,
            result,
        } => {
            if *state.phase() != SessionPhase::Encrypting || !state.is_open(&document_id) {
                engine_debug!("Encryption result for {} is stale; ignored", document_id);
                return (state, Vec::new());
            }
            match result {
                Ok(key) => {
                    state.set_decryption_key(key);
                    state.set_phase(SessionPhase::Encrypted);
                    state.set_notice(Notice::info("Encryption successful."));
                    vec![Effect::DownloadTokenized { document_id }]
                }
                Err(message) => {
                    engine_warn!("Encryption failed: {}", message);
                    state.set_phase(SessionPhase::Saved);
                    state.set_notice(Notice::error(format!("Failed to encrypt: {message}")));
                    Vec::new()
                }
            }
        }
        Msg::TokenizedDownloaded(result) => {
            state.set_notice(match result {
                Ok(location) => Notice::info(format!("Tokenized text written to {location}.")),
                Err(message) => Notice::error(format!("Failed to download tokenized text: {message}")),
            });
            Vec::new()
        }
        Msg::DecryptRequested { key } => {
            let key = key.trim().to_string();
            match state.document_id().map(str::to_string) {
                Some(_) if key.is_empty() => {
                    state.set_notice(Notice::error("A decryption key is required."));
                    Vec::new()
                }
                Some(document_id) => vec![Effect::Decrypt { document_id, key }],
                None => Vec::new(),
            }
        }
        Msg::DecryptCompleted {
            document_id,
            result,
        } => {
            if !state.is_open(&document_id) {
                engine_debug!("Decryption result for {} is stale; ignored", document_id);
                return (state, Vec::new());
            }
            match result {
                Ok(text) => {
                    state.set_notice(Notice::info(format!(
                        "Decrypted {} characters.",
                        text.chars().count()
                    )));
                    state.set_decrypted_text(text);
                }
                Err(message) => {
                    state.set_notice(Notice::error(format!("Failed to decrypt: {message}")))
                }
            }
            Vec::new()
        }
        Msg::ExportClicked => {
            if !state.phase().accepts_edits() {
                return (state, Vec::new());
            }
            match state.annotations() {
                Some(annotations) => vec![Effect::ExportReport(ReportSnapshot {
                    document_id: annotations.document().id().to_string(),
                    spans: annotations.selected_spans(),
                    summary: annotations.summary(),
                    original_text_length: annotations.document().char_len(),
                })],
                None => Vec::new(),
            }
        }
        Msg::ExportCompleted(result) => {
            state.set_notice(match result {
                Ok(location) => Notice::info(format!("Report written to {location}.")),
                Err(message) => Notice::error(format!("Failed to export report: {message}")),
            });
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn cancel(superseded: Option<JobTicket>) -> Vec<Effect> {
    superseded
        .into_iter()
        .map(|ticket| {
            engine_info!("Cancelling detection job {}", ticket);
            Effect::CancelDetection { ticket }
        })
        .collect()
}

fn start_detection(state: &mut AppState) -> Vec<Effect> {
    match state.start_detection() {
        Some((ticket, PollStep::PollAfter(delay))) => vec![Effect::PollDetection { ticket, delay }],
        _ => Vec::new(),
    }
}

fn load_detected(state: &mut AppState, spans: Vec<crate::Span>) {
    let rejected = state.load_detected(spans);
    state.set_phase(SessionPhase::Editing);
    if !rejected.is_empty() {
        state.set_notice(Notice::info(format!(
            "Ignored {} detected span(s) that were invalid or overlapping.",
            rejected.len()
        )));
    }
}

/// Edits that leave unsaved changes withdraw a previous save or encryption.
fn after_edit(state: &mut AppState) {
    let dirty = state.annotations().is_some_and(|a| a.is_dirty());
    if dirty && matches!(state.phase(), SessionPhase::Saved | SessionPhase::Encrypted) {
        state.set_phase(SessionPhase::Editing);
    }
    state.mark_view_changed();
}

fn reject_edit(state: &mut AppState, err: EditError) {
    engine_debug!("Edit rejected: {}", err);
    let text = match err {
        EditError::IndexOutOfRange { index, len } => {
            format!("There is no span #{index} (the document has {len}).")
        }
        EditError::NotFound { offset } => format!(
            "Selected text was not found at position {offset}. Please select the text again."
        ),
        EditError::Overlap { existing, .. } => format!(
            "This text overlaps existing PII span #{existing}. Please select different text."
        ),
    };
    state.set_notice(Notice::error(text));
}
