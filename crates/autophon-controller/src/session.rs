//! Request session state machine.
//!
//! # States
//!
//! - `Idle`: no entry request outstanding
//! - `Requesting`: bell ringing, timeout armed, waiting for pickup
//! - `Opened`: pickup observed (or automatic mode), door triggered
//! - `TimedOut`: nobody picked up in time
//! - `Cancelled`: pre-empted, e.g. by the push-button
//!
//! # Valid Transitions
//!
//! - Idle → Requesting → Opened/TimedOut/Cancelled → Idle
//! - Idle → Opened → Idle (automatic mode)
//!
//! Terminal states are passed through: [`SessionMachine`] records the
//! finished session and returns to `Idle` in the same step.
//!
//! # Examples
//!
//! ```
//! use autophon_controller::session::{RequestState, SessionMachine};
//!
//! let mut machine = SessionMachine::new();
//! let id = machine.begin().unwrap();
//!
//! let record = machine.finish(RequestState::TimedOut).unwrap();
//! assert_eq!(record.id, id);
//! assert_eq!(machine.state(), RequestState::Idle);
//! ```

use std::collections::VecDeque;
use std::fmt;

use autophon_core::constants::MAX_SESSION_HISTORY;
use autophon_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of the request arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// No entry request outstanding.
    Idle,

    /// Ringing and waiting for pickup.
    Requesting,

    /// Door triggered.
    Opened,

    /// No pickup before the deadline.
    TimedOut,

    /// Pre-empted before pickup or timeout.
    Cancelled,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            RequestState::Idle => "Idle",
            RequestState::Requesting => "Requesting",
            RequestState::Opened => "Opened",
            RequestState::TimedOut => "TimedOut",
            RequestState::Cancelled => "Cancelled",
        };
        write!(f, "{state}")
    }
}

impl RequestState {
    /// Check if transitioning to `target` is allowed.
    ///
    /// ```
    /// use autophon_controller::session::RequestState;
    ///
    /// assert!(RequestState::Idle.can_transition_to(&RequestState::Requesting));
    /// assert!(!RequestState::Idle.can_transition_to(&RequestState::TimedOut));
    /// ```
    pub fn can_transition_to(&self, target: &RequestState) -> bool {
        matches!(
            (self, target),
            (RequestState::Idle, RequestState::Requesting | RequestState::Opened)
                | (
                    RequestState::Requesting,
                    RequestState::Opened | RequestState::TimedOut | RequestState::Cancelled
                )
                | (
                    RequestState::Opened | RequestState::TimedOut | RequestState::Cancelled,
                    RequestState::Idle
                )
        )
    }

    /// Whether this state ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Opened | RequestState::TimedOut | RequestState::Cancelled
        )
    }
}

/// A finished request session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session number, increasing from 1.
    pub id: u64,

    /// Terminal state the session ended in.
    pub outcome: RequestState,

    /// Opened by automatic mode without ringing.
    pub automatic: bool,

    /// Number of `request()` calls that extended the deadline.
    pub keep_alives: u32,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the session ended.
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: u64,
    started_at: DateTime<Utc>,
    keep_alives: u32,
}

/// Session state machine with a bounded history of finished sessions.
///
/// Not thread-safe on its own; the arbiter keeps it behind its lock.
#[derive(Debug)]
pub struct SessionMachine {
    state: RequestState,
    active: Option<ActiveSession>,
    last_id: u64,
    history: VecDeque<SessionRecord>,
}

impl SessionMachine {
    /// Create an idle machine with empty history.
    pub fn new() -> Self {
        Self {
            state: RequestState::Idle,
            active: None,
            last_id: 0,
            history: VecDeque::with_capacity(MAX_SESSION_HISTORY),
        }
    }

    /// Current state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Id of the session in progress.
    pub fn active_id(&self) -> Option<u64> {
        self.active.as_ref().map(|session| session.id)
    }

    /// Finished sessions, oldest first.
    pub fn history(&self) -> &VecDeque<SessionRecord> {
        &self.history
    }

    /// Start a ringing session.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless the machine is idle.
    pub fn begin(&mut self) -> Result<u64> {
        self.transition_to(RequestState::Requesting)?;
        self.last_id += 1;
        self.active = Some(ActiveSession {
            id: self.last_id,
            started_at: Utc::now(),
            keep_alives: 0,
        });
        Ok(self.last_id)
    }

    /// Record a keep-alive on the session in progress.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless a session is ringing.
    pub fn keep_alive(&mut self) -> Result<u32> {
        if self.state == RequestState::Requesting
            && let Some(session) = self.active.as_mut()
        {
            session.keep_alives += 1;
            return Ok(session.keep_alives);
        }
        Err(self.invalid(RequestState::Requesting))
    }

    /// End the session in progress with `outcome` and return to idle.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if `outcome` is not a terminal
    /// state reachable from the current one.
    pub fn finish(&mut self, outcome: RequestState) -> Result<SessionRecord> {
        if self.state != RequestState::Requesting || !outcome.is_terminal() {
            return Err(self.invalid(outcome));
        }
        let session = self.active.take().unwrap_or_else(|| ActiveSession {
            id: self.last_id,
            started_at: Utc::now(),
            keep_alives: 0,
        });
        self.transition_to(outcome)?;
        Ok(self.close(session, outcome, false))
    }

    /// Pass straight through `Opened` without ringing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless the machine is idle.
    pub fn open_immediately(&mut self) -> Result<SessionRecord> {
        self.transition_to(RequestState::Opened)?;
        self.last_id += 1;
        let session = ActiveSession {
            id: self.last_id,
            started_at: Utc::now(),
            keep_alives: 0,
        };
        Ok(self.close(session, RequestState::Opened, true))
    }

    fn transition_to(&mut self, new_state: RequestState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(self.invalid(new_state));
        }
        self.state = new_state;
        Ok(())
    }

    fn close(&mut self, session: ActiveSession, outcome: RequestState, automatic: bool) -> SessionRecord {
        let record = SessionRecord {
            id: session.id,
            outcome,
            automatic,
            keep_alives: session.keep_alives,
            started_at: session.started_at,
            finished_at: Utc::now(),
        };
        self.state = RequestState::Idle;
        self.history.push_back(record.clone());
        if self.history.len() > MAX_SESSION_HISTORY {
            self.history.pop_front();
        }
        record
    }

    fn invalid(&self, to: RequestState) -> Error {
        Error::InvalidStateTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RequestState::Idle, RequestState::Requesting, true)]
    #[case(RequestState::Idle, RequestState::Opened, true)]
    #[case(RequestState::Idle, RequestState::TimedOut, false)]
    #[case(RequestState::Idle, RequestState::Cancelled, false)]
    #[case(RequestState::Requesting, RequestState::Opened, true)]
    #[case(RequestState::Requesting, RequestState::TimedOut, true)]
    #[case(RequestState::Requesting, RequestState::Cancelled, true)]
    #[case(RequestState::Requesting, RequestState::Idle, false)]
    #[case(RequestState::Requesting, RequestState::Requesting, false)]
    #[case(RequestState::Opened, RequestState::Idle, true)]
    #[case(RequestState::TimedOut, RequestState::Idle, true)]
    #[case(RequestState::Cancelled, RequestState::Requesting, false)]
    fn test_transition_table(
        #[case] from: RequestState,
        #[case] to: RequestState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(&to), allowed);
    }

    #[test]
    fn test_new_machine_is_idle() {
        let machine = SessionMachine::new();
        assert_eq!(machine.state(), RequestState::Idle);
        assert_eq!(machine.active_id(), None);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_begin_and_finish_records_session() {
        let mut machine = SessionMachine::new();

        let id = machine.begin().unwrap();
        assert_eq!(machine.state(), RequestState::Requesting);
        assert_eq!(machine.active_id(), Some(id));

        assert_eq!(machine.keep_alive().unwrap(), 1);
        let record = machine.finish(RequestState::Opened).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.outcome, RequestState::Opened);
        assert_eq!(record.keep_alives, 1);
        assert!(!record.automatic);
        assert!(record.finished_at >= record.started_at);
        assert_eq!(machine.state(), RequestState::Idle);
        assert_eq!(machine.active_id(), None);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let mut machine = SessionMachine::new();
        machine.begin().unwrap();

        let result = machine.begin();
        assert!(matches!(result, Err(Error::InvalidStateTransition { .. })));
    }

    #[test]
    fn test_finish_when_idle_is_rejected() {
        let mut machine = SessionMachine::new();

        assert!(machine.finish(RequestState::Cancelled).is_err());
        assert!(machine.keep_alive().is_err());
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_finish_requires_terminal_outcome() {
        let mut machine = SessionMachine::new();
        machine.begin().unwrap();

        assert!(machine.finish(RequestState::Idle).is_err());
        assert_eq!(machine.state(), RequestState::Requesting);
    }

    #[test]
    fn test_open_immediately() {
        let mut machine = SessionMachine::new();

        let record = machine.open_immediately().unwrap();

        assert!(record.automatic);
        assert_eq!(record.outcome, RequestState::Opened);
        assert_eq!(machine.state(), RequestState::Idle);
    }

    #[test]
    fn test_session_ids_increase() {
        let mut machine = SessionMachine::new();

        let first = machine.begin().unwrap();
        machine.finish(RequestState::TimedOut).unwrap();
        let second = machine.open_immediately().unwrap().id;

        assert!(second > first);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = SessionMachine::new();

        for _ in 0..MAX_SESSION_HISTORY + 5 {
            machine.begin().unwrap();
            machine.finish(RequestState::TimedOut).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_SESSION_HISTORY);
        assert_eq!(machine.history().front().unwrap().id, 6);
    }

    #[test]
    fn test_record_serializes() {
        let mut machine = SessionMachine::new();
        machine.begin().unwrap();
        let record = machine.finish(RequestState::TimedOut).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["outcome"], "timed_out");
    }
}
