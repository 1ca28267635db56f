//! Redaction core: span annotation state, detection polling and the pure
//! session state machine.
mod annotations;
mod effect;
mod error;
mod insert;
mod msg;
mod poller;
mod segment;
mod selection;
mod span;
mod span_set;
mod state;
mod summary;
mod update;
mod view_model;

pub use annotations::Annotations;
pub use effect::{Effect, ReportSnapshot, SaveRequest};
pub use error::EditError;
pub use msg::{DetectionStatus, Msg};
pub use poller::{DetectionPoller, JobTicket, PollOutcome, PollSettings, PollStep, PollerState};
pub use segment::{render, Segment};
pub use selection::{Baseline, SelectionState};
pub use span::{
    CharRange, Document, Origin, PiiType, Span, UnknownPiiType, HIGH_CONFIDENCE_THRESHOLD,
    MANUAL_CONFIDENCE,
};
pub use span_set::{RejectReason, RejectedSpan, SpanSet};
pub use state::{AppState, DetectionFailure, Notice, NoticeLevel, SessionPhase};
pub use summary::PiiSummary;
pub use update::update;
pub use view_model::AppViewModel;
