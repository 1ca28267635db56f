use crate::segment::render;
use crate::view_model::AppViewModel;
use crate::{
    Annotations, Baseline, DetectionPoller, Document, JobTicket, PollSettings, PollStep,
    RejectedSpan, Span, SpanSet,
};

/// Where the single open document is in its lifecycle. Replaces separate
/// dirty / show-encrypt / encrypted flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Empty,
    Detecting,
    DetectionFailed(DetectionFailure),
    Editing,
    Saving,
    Saved,
    Encrypting,
    Encrypted,
}

impl SessionPhase {
    /// Span edits are accepted once spans are loaded and no encryption is
    /// running.
    pub fn accepts_edits(&self) -> bool {
        matches!(
            self,
            SessionPhase::Editing | SessionPhase::Saving | SessionPhase::Saved | SessionPhase::Encrypted
        )
    }

    pub fn accepts_save(&self) -> bool {
        matches!(
            self,
            SessionPhase::Editing | SessionPhase::Saved | SessionPhase::Encrypted
        )
    }

    pub fn can_encrypt(&self) -> bool {
        *self == SessionPhase::Saved
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionFailure {
    TimedOut { attempts: u32 },
    Error { attempts: u32, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingSave {
    ticket: JobTicket,
    baseline: Baseline,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    poll_settings: PollSettings,
    phase: SessionPhase,
    annotations: Option<Annotations>,
    poller: Option<DetectionPoller>,
    generation: u64,
    pending_save: Option<PendingSave>,
    decryption_key: Option<String>,
    decrypted_text: Option<String>,
    notice: Option<Notice>,
    view_changed: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_settings(poll_settings: PollSettings) -> Self {
        Self {
            poll_settings,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn annotations(&self) -> Option<&Annotations> {
        self.annotations.as_ref()
    }

    pub fn poller(&self) -> Option<&DetectionPoller> {
        self.poller.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        let mut view = AppViewModel {
            phase: self.phase.clone(),
            can_encrypt: self.phase.can_encrypt(),
            detection_attempts: self.poller.as_ref().map_or(0, DetectionPoller::attempts),
            decryption_key: self.decryption_key.clone(),
            decrypted_text: self.decrypted_text.clone(),
            notice: self.notice.clone(),
            ..AppViewModel::default()
        };
        if let Some(annotations) = &self.annotations {
            view.document_id = Some(annotations.document().id().to_string());
            view.segments = render(
                annotations.document(),
                annotations.spans(),
                annotations.selection(),
            );
            view.span_count = annotations.spans().len();
            view.summary = annotations.summary();
            view.has_unsaved_changes = annotations.is_dirty();
        }
        view
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_view_changed(&mut self) -> bool {
        std::mem::take(&mut self.view_changed)
    }

    pub(crate) fn mark_view_changed(&mut self) {
        self.view_changed = true;
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.mark_view_changed();
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_view_changed();
    }

    pub(crate) fn document_id(&self) -> Option<&str> {
        self.annotations.as_ref().map(|a| a.document().id())
    }

    pub(crate) fn annotations_mut(&mut self) -> Option<&mut Annotations> {
        self.annotations.as_mut()
    }

    /// Replace the open document; returns the ticket of a superseded poller.
    pub(crate) fn open_document(&mut self, document: Document, spans: SpanSet) -> Option<JobTicket> {
        let superseded = self.take_active_ticket();
        self.annotations = Some(Annotations::initialize(document, spans));
        self.pending_save = None;
        self.decryption_key = None;
        self.decrypted_text = None;
        self.notice = None;
        self.mark_view_changed();
        superseded
    }

    /// Drop everything; returns the ticket of a cancelled poller.
    pub(crate) fn discard_document(&mut self) -> Option<JobTicket> {
        let superseded = self.take_active_ticket();
        let poll_settings = self.poll_settings;
        let generation = self.generation;
        *self = AppState {
            poll_settings,
            generation,
            ..AppState::default()
        };
        self.mark_view_changed();
        superseded
    }

    /// Start a fresh detection job for the open document.
    pub(crate) fn start_detection(&mut self) -> Option<(JobTicket, PollStep)> {
        let document_id = self.document_id()?.to_string();
        self.generation += 1;
        let ticket = JobTicket {
            document_id,
            generation: self.generation,
        };
        let mut poller = DetectionPoller::new(ticket.clone(), self.poll_settings);
        let step = poller.start();
        self.poller = Some(poller);
        self.set_phase(SessionPhase::Detecting);
        Some((ticket, step))
    }

    pub(crate) fn advance_detection(
        &mut self,
        ticket: &JobTicket,
        outcome: crate::PollOutcome,
    ) -> PollStep {
        match self.poller.as_mut() {
            Some(poller) => poller.advance(ticket, outcome),
            None => PollStep::Stale,
        }
    }

    /// Validate detector spans and make them the session's span set.
    pub(crate) fn load_detected(&mut self, detected: Vec<Span>) -> Vec<RejectedSpan> {
        let Some(annotations) = self.annotations.take() else {
            return Vec::new();
        };
        let document = annotations.into_document();
        let (spans, rejected) = SpanSet::from_detected(&document, detected);
        self.annotations = Some(Annotations::initialize(document, spans));
        self.mark_view_changed();
        rejected
    }

    /// Snapshot the baseline candidate under a fresh ticket; only a
    /// completion carrying that ticket may commit it.
    pub(crate) fn begin_save(&mut self) -> Option<JobTicket> {
        let annotations = self.annotations.as_ref()?;
        let baseline = annotations.baseline_candidate();
        let document_id = annotations.document().id().to_string();
        self.generation += 1;
        let ticket = JobTicket {
            document_id,
            generation: self.generation,
        };
        self.pending_save = Some(PendingSave {
            ticket: ticket.clone(),
            baseline,
        });
        self.set_phase(SessionPhase::Saving);
        Some(ticket)
    }

    /// The pending baseline, if `ticket` is the save in flight.
    pub(crate) fn finish_save(&mut self, ticket: &JobTicket) -> Option<Baseline> {
        if self.phase != SessionPhase::Saving {
            return None;
        }
        match self.pending_save.take() {
            Some(pending) if pending.ticket == *ticket => Some(pending.baseline),
            other => {
                self.pending_save = other;
                None
            }
        }
    }

    /// Whether `document_id` names the open document.
    pub(crate) fn is_open(&self, document_id: &str) -> bool {
        self.document_id() == Some(document_id)
    }

    pub(crate) fn set_decryption_key(&mut self, key: Option<String>) {
        self.decryption_key = key;
        self.mark_view_changed();
    }

    pub(crate) fn set_decrypted_text(&mut self, text: String) {
        self.decrypted_text = Some(text);
        self.mark_view_changed();
    }

    fn take_active_ticket(&mut self) -> Option<JobTicket> {
        let poller = self.poller.take()?;
        if poller.state().is_terminal() {
            None
        } else {
            Some(poller.ticket().clone())
        }
    }
}
