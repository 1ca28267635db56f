use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{ClientSettings, ReqwestSyncClient, SyncClient};
use crate::{AuditQuery, ClientError, EngineEvent, JobId, SavePayload};

/// Receives every event the engine produces.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    Extract {
        filename: String,
        content: Vec<u8>,
    },
    PollDetection {
        job_id: JobId,
        file_id: String,
        delay: Duration,
    },
    CancelDetection {
        job_id: JobId,
    },
    Save {
        request_id: JobId,
        payload: SavePayload,
    },
    Encrypt {
        file_id: String,
    },
    DownloadTokenized {
        file_id: String,
    },
    Decrypt {
        file_id: String,
        key: String,
    },
    FetchAuditLogs(AuditQuery),
}

type PendingPolls = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Front of the IO thread. Commands are queued and run on a tokio runtime
/// owned by that thread; results come back through the [`EventSink`].
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(client: Arc<dyn SyncClient>, sink: Arc<dyn EventSink>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("redact-engine".into())
            .spawn(move || {
                let pending: PendingPolls = Arc::new(Mutex::new(HashMap::new()));
                while let Ok(command) = cmd_rx.recv() {
                    let client = client.clone();
                    let sink = sink.clone();
                    match command {
                        EngineCommand::CancelDetection { job_id } => cancel_poll(&pending, job_id),
                        EngineCommand::PollDetection {
                            job_id,
                            file_id,
                            delay,
                        } => {
                            // Registered before spawning so a cancel queued right
                            // behind this command always finds the token.
                            let token = register_poll(&pending, job_id);
                            let pending = pending.clone();
                            runtime.spawn(async move {
                                let poll = PendingPoll {
                                    job_id,
                                    file_id,
                                    delay,
                                    token,
                                };
                                poll_detection(client.as_ref(), sink.as_ref(), &pending, poll)
                                    .await;
                            });
                        }
                        command => {
                            runtime.spawn(async move {
                                handle_command(client.as_ref(), sink.as_ref(), command).await;
                            });
                        }
                    }
                }
                engine_debug!("engine command channel closed");
            })?;

        Ok(Self { cmd_tx })
    }

    /// Engine backed by [`ReqwestSyncClient`] that reports into a channel.
    pub fn with_settings(
        settings: ClientSettings,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>), ClientError> {
        let client = ReqwestSyncClient::new(settings)?;
        let (event_tx, event_rx) = mpsc::channel();
        let handle = Self::new(Arc::new(client), Arc::new(ChannelEventSink::new(event_tx)))
            .map_err(|err| {
                ClientError::new(crate::FailureKind::Transport, format!("engine start: {err}"))
            })?;
        Ok((handle, event_rx))
    }

    pub fn extract(&self, filename: impl Into<String>, content: Vec<u8>) {
        self.send(EngineCommand::Extract {
            filename: filename.into(),
            content,
        });
    }

    pub fn poll_detection(&self, job_id: JobId, file_id: impl Into<String>, delay: Duration) {
        self.send(EngineCommand::PollDetection {
            job_id,
            file_id: file_id.into(),
            delay,
        });
    }

    /// Drop a scheduled or in-flight poll; no event is emitted for it.
    pub fn cancel_detection(&self, job_id: JobId) {
        self.send(EngineCommand::CancelDetection { job_id });
    }

    /// `request_id` is echoed in [`EngineEvent::Saved`].
    pub fn save(&self, request_id: JobId, payload: SavePayload) {
        self.send(EngineCommand::Save {
            request_id,
            payload,
        });
    }

    pub fn encrypt(&self, file_id: impl Into<String>) {
        self.send(EngineCommand::Encrypt {
            file_id: file_id.into(),
        });
    }

    pub fn download_tokenized(&self, file_id: impl Into<String>) {
        self.send(EngineCommand::DownloadTokenized {
            file_id: file_id.into(),
        });
    }

    pub fn decrypt(&self, file_id: impl Into<String>, key: impl Into<String>) {
        self.send(EngineCommand::Decrypt {
            file_id: file_id.into(),
            key: key.into(),
        });
    }

    pub fn fetch_audit_logs(&self, query: AuditQuery) {
        self.send(EngineCommand::FetchAuditLogs(query));
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("engine thread is gone; command dropped");
        }
    }
}

fn cancel_poll(pending: &PendingPolls, job_id: JobId) {
    let token = match pending.lock() {
        Ok(mut polls) => polls.remove(&job_id),
        Err(_) => None,
    };
    if let Some(token) = token {
        engine_debug!("cancelling detection poll for job {job_id}");
        token.cancel();
    }
}

fn register_poll(pending: &PendingPolls, job_id: JobId) -> CancellationToken {
    let token = CancellationToken::new();
    if let Ok(mut polls) = pending.lock() {
        if let Some(previous) = polls.insert(job_id, token.clone()) {
            previous.cancel();
        }
    }
    token
}

// A newer registration cancels the older token, so an uncancelled token is
// still the one stored for the job.
fn finish_poll(pending: &PendingPolls, job_id: JobId, token: &CancellationToken) {
    if token.is_cancelled() {
        return;
    }
    if let Ok(mut polls) = pending.lock() {
        polls.remove(&job_id);
    }
}

struct PendingPoll {
    job_id: JobId,
    file_id: String,
    delay: Duration,
    token: CancellationToken,
}

async fn poll_detection(
    client: &dyn SyncClient,
    sink: &dyn EventSink,
    pending: &PendingPolls,
    poll: PendingPoll,
) {
    let PendingPoll {
        job_id,
        file_id,
        delay,
        token,
    } = poll;
    let polled = tokio::select! {
        _ = token.cancelled() => None,
        result = async {
            tokio::time::sleep(delay).await;
            client.fetch_detection(&file_id).await
        } => Some(result),
    };
    finish_poll(pending, job_id, &token);
    match polled {
        Some(result) if !token.is_cancelled() => {
            sink.emit(EngineEvent::DetectionPolled {
                job_id,
                file_id,
                result,
            });
        }
        _ => engine_debug!("detection poll for job {job_id} cancelled"),
    }
}

async fn handle_command(client: &dyn SyncClient, sink: &dyn EventSink, command: EngineCommand) {
    match command {
        EngineCommand::Extract { filename, content } => {
            let result = client.extract(&filename, content).await;
            if let Ok(response) = &result {
                engine_info!(
                    "extracted {} characters, detection {:?}",
                    response.character_count.unwrap_or_default(),
                    response.pii_detection_status
                );
            }
            sink.emit(EngineEvent::Extracted { result });
        }
        EngineCommand::PollDetection { .. } | EngineCommand::CancelDetection { .. } => {
            engine_warn!("detection commands are handled on the engine thread");
        }
        EngineCommand::Save {
            request_id,
            payload,
        } => {
            let result = client.save(&payload).await;
            sink.emit(EngineEvent::Saved {
                request_id,
                file_id: payload.file_id,
                result,
            });
        }
        EngineCommand::Encrypt { file_id } => {
            let result = client.encrypt(&file_id).await;
            sink.emit(EngineEvent::Encrypted { file_id, result });
        }
        EngineCommand::DownloadTokenized { file_id } => {
            let result = client.download_tokenized(&file_id).await;
            sink.emit(EngineEvent::TokenizedDownloaded { file_id, result });
        }
        EngineCommand::Decrypt { file_id, key } => {
            let result = client.decrypt(&file_id, &key).await;
            sink.emit(EngineEvent::Decrypted { file_id, result });
        }
        EngineCommand::FetchAuditLogs(query) => {
            let result = client.audit_logs(&query).await;
            sink.emit(EngineEvent::AuditLogsFetched { result });
        }
    }
}
