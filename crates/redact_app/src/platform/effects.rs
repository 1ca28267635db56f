use std::path::Path;
use std::sync::mpsc;
use std::thread;

use chrono::Utc;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use redact_core::{
    CharRange, DetectionStatus, Document, Effect, JobTicket, Msg, PiiSummary, PiiType,
    PollOutcome, Span,
};
use redact_engine::{
    tokenized_filename, AtomicFileWriter, DetectionPoll, EngineEvent, EngineHandle,
    ExtractResponse, PiiDetectionStatus, PiiMatch, PiiSummaryPayload, SavePayload,
};

use super::app::Inbox;
use super::export;

/// Executes core effects on the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    writer: AtomicFileWriter,
    inbox: mpsc::Sender<Inbox>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, output_dir: &Path, inbox: mpsc::Sender<Inbox>) -> Self {
        Self {
            engine,
            writer: AtomicFileWriter::new(output_dir.to_path_buf()),
            inbox,
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::PollDetection { ticket, delay } => {
                    engine_debug!("PollDetection {} in {:?}", ticket, delay);
                    self.engine
                        .poll_detection(ticket.generation, ticket.document_id, delay);
                }
                Effect::CancelDetection { ticket } => {
                    engine_debug!("CancelDetection {}", ticket);
                    self.engine.cancel_detection(ticket.generation);
                }
                Effect::SaveSpans(request) => {
                    engine_info!(
                        "Saving {} span(s) for document {}",
                        request.spans.len(),
                        request.document_id
                    );
                    self.engine.save(
                        request.ticket.generation,
                        SavePayload {
                            file_id: request.document_id,
                            pii_matches: request.spans.iter().map(match_from_span).collect(),
                            pii_summary: summary_payload(&request.summary),
                            original_text: request.original_text,
                        },
                    );
                }
                Effect::Encrypt { document_id } => self.engine.encrypt(document_id),
                Effect::DownloadTokenized { document_id } => {
                    self.engine.download_tokenized(document_id)
                }
                Effect::Decrypt { document_id, key } => self.engine.decrypt(document_id, key),
                Effect::ExportReport(snapshot) => {
                    let result = export::write_report(&self.writer, &snapshot, Utc::now())
                        .map(|path| path.display().to_string())
                        .map_err(|err| {
                            engine_error!("Report export failed: {:#}", err);
                            format!("{err:#}")
                        });
                    let _ = self.inbox.send(Inbox::Msg(Msg::ExportCompleted(result)));
                }
            }
        }
    }

    /// Forward engine events to the inbox until the engine side hangs up.
    pub fn spawn_event_loop(&self, events: mpsc::Receiver<EngineEvent>) {
        let writer = self.writer.clone();
        let inbox = self.inbox.clone();
        thread::spawn(move || {
            for event in events {
                let item = event_to_inbox(event, &writer);
                if inbox.send(item).is_err() {
                    break;
                }
            }
        });
    }
}

fn event_to_inbox(event: EngineEvent, writer: &AtomicFileWriter) -> Inbox {
    match event {
        EngineEvent::Extracted { result } => match result {
            Ok(response) => Inbox::Msg(extracted_msg(response)),
            Err(err) => Inbox::Failed(format!("text extraction failed: {err}")),
        },
        EngineEvent::DetectionPolled {
            job_id,
            file_id,
            result,
        } => {
            let outcome = match result {
                Ok(DetectionPoll::Ready(result)) => {
                    PollOutcome::Ready(result.pii_matches.into_iter().map(span_from_match).collect())
                }
                Ok(DetectionPoll::NotReady) => PollOutcome::NotReady,
                Err(err) => {
                    engine_warn!("Detection poll for {} failed: {}", file_id, err);
                    PollOutcome::TransportFailure(err.to_string())
                }
            };
            Inbox::Msg(Msg::DetectionPolled {
                ticket: JobTicket {
                    document_id: file_id,
                    generation: job_id,
                },
                outcome,
            })
        }
        EngineEvent::Saved {
            request_id,
            file_id,
            result,
        } => Inbox::Msg(Msg::SaveCompleted {
            ticket: JobTicket {
                document_id: file_id,
                generation: request_id,
            },
            result: result
                .map(|response| response.message.unwrap_or_default())
                .map_err(|err| err.to_string()),
        }),
        EngineEvent::Encrypted { file_id, result } => Inbox::Msg(Msg::EncryptCompleted {
            document_id: file_id,
            result: result
                .map(|response| response.decryption_key)
                .map_err(|err| err.to_string()),
        }),
        EngineEvent::TokenizedDownloaded { file_id, result } => {
            let result = result.map_err(|err| err.to_string()).and_then(|bytes| {
                writer
                    .write(&tokenized_filename(&file_id), &bytes)
                    .map(|path| path.display().to_string())
                    .map_err(|err| err.to_string())
            });
            Inbox::Msg(Msg::TokenizedDownloaded(result))
        }
        EngineEvent::Decrypted { file_id, result } => Inbox::Msg(Msg::DecryptCompleted {
            document_id: file_id,
            result: result
                .map(|response| response.decrypted_text)
                .map_err(|err| err.to_string()),
        }),
        EngineEvent::AuditLogsFetched { .. } => {
            engine_debug!("Ignoring audit log result during an annotation session");
            Inbox::Msg(Msg::NoOp)
        }
    }
}

fn extracted_msg(response: ExtractResponse) -> Msg {
    let detection = match (&response.file_id, response.pii_detection_status) {
        (Some(_), Some(PiiDetectionStatus::Started)) => DetectionStatus::Started,
        (_, Some(PiiDetectionStatus::Started)) | (_, Some(PiiDetectionStatus::Unavailable)) => {
            DetectionStatus::Unavailable
        }
        _ => DetectionStatus::NotApplicable,
    };
    let id = response
        .file_id
        .or(response.filename)
        .unwrap_or_else(|| "document".to_string());
    Msg::DocumentExtracted {
        document: Document::new(id, response.text),
        detection,
    }
}

pub(crate) fn span_from_match(raw: PiiMatch) -> Span {
    Span::detected(
        raw.text,
        PiiType::from_wire(&raw.pii_type),
        CharRange::new(raw.start_pos, raw.end_pos),
        raw.confidence,
    )
}

pub(crate) fn match_from_span(span: &Span) -> PiiMatch {
    PiiMatch {
        text: span.text.clone(),
        pii_type: span.pii_type.as_str().to_string(),
        start_pos: span.range.start,
        end_pos: span.range.end,
        confidence: span.confidence,
    }
}

pub(crate) fn summary_payload(summary: &PiiSummary) -> PiiSummaryPayload {
    PiiSummaryPayload {
        total_pii_found: summary.active_count,
        high_confidence_count: summary.high_confidence_count,
        pii_types: summary
            .per_type
            .iter()
            .map(|(pii_type, count)| (pii_type.as_str().to_string(), *count))
            .collect(),
    }
}
