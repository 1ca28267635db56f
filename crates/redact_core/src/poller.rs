use std::fmt;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between status requests.
    pub interval: Duration,
    /// Status responses tolerated before giving up.
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 60,
        }
    }
}

/// Identity of one detection job. A newer generation for the same document
/// supersedes every older one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobTicket {
    pub document_id: String,
    pub generation: u64,
}

impl fmt::Display for JobTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document_id, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Processing,
    Completed,
    Error,
    TimedOut,
}

impl PollerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PollerState::Completed | PollerState::Error | PollerState::TimedOut
        )
    }
}

/// Answer to one status request.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready(Vec<Span>),
    NotReady,
    TransportFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cause {
    NotReady,
    Transport,
}

/// What the scheduler should do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Issue the next status request after `delay`.
    PollAfter(Duration),
    Completed(Vec<Span>),
    TimedOut { attempts: u32 },
    Failed { attempts: u32, message: String },
    /// Callback for another job or for a finished one; ignore it.
    Stale,
}

/// Detection job state machine. It performs no IO; an external scheduler
/// issues the requests and feeds the outcomes back through `advance`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionPoller {
    ticket: JobTicket,
    settings: PollSettings,
    state: PollerState,
    attempts: u32,
    last_cause: Option<Cause>,
    last_error: Option<String>,
}

impl DetectionPoller {
    pub fn new(ticket: JobTicket, settings: PollSettings) -> Self {
        Self {
            ticket,
            settings,
            state: PollerState::Idle,
            attempts: 0,
            last_cause: None,
            last_error: None,
        }
    }

    pub fn ticket(&self) -> &JobTicket {
        &self.ticket
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Submission acknowledged: `Idle -> Processing`, poll immediately.
    pub fn start(&mut self) -> PollStep {
        if self.state != PollerState::Idle {
            return PollStep::Stale;
        }
        self.state = PollerState::Processing;
        engine_info!("Detection job {} started", self.ticket);
        PollStep::PollAfter(Duration::ZERO)
    }

    pub fn advance(&mut self, ticket: &JobTicket, outcome: PollOutcome) -> PollStep {
        if *ticket != self.ticket || self.state != PollerState::Processing {
            engine_debug!(
                "Discarding poll result for {} (active {} in {:?})",
                ticket,
                self.ticket,
                self.state
            );
            return PollStep::Stale;
        }

        match outcome {
            PollOutcome::Ready(spans) => {
                self.state = PollerState::Completed;
                engine_info!(
                    "Detection job {} completed after {} attempt(s) with {} span(s)",
                    self.ticket,
                    self.attempts + 1,
                    spans.len()
                );
                return PollStep::Completed(spans);
            }
            PollOutcome::NotReady => {
                self.last_cause = Some(Cause::NotReady);
            }
            PollOutcome::TransportFailure(message) => {
                engine_warn!("Detection job {} poll failed: {}", self.ticket, message);
                self.last_cause = Some(Cause::Transport);
                self.last_error = Some(message);
            }
        }

        self.attempts += 1;
        if self.attempts < self.settings.max_attempts {
            return PollStep::PollAfter(self.settings.interval);
        }

        match self.last_cause {
            Some(Cause::Transport) => {
                self.state = PollerState::Error;
                let message = self
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "transport failure".to_string());
                engine_warn!(
                    "Detection job {} failed after {} attempts",
                    self.ticket,
                    self.attempts
                );
                PollStep::Failed {
                    attempts: self.attempts,
                    message,
                }
            }
            _ => {
                self.state = PollerState::TimedOut;
                engine_warn!(
                    "Detection job {} timed out after {} attempts",
                    self.ticket,
                    self.attempts
                );
                PollStep::TimedOut {
                    attempts: self.attempts,
                }
            }
        }
    }
}
