//! Session state machine.
//!
//! The machine is wall-clock based and level-triggered: it holds no timers.
//! The caller invokes `evaluate()` periodically with the current time and the
//! machine moves to whatever state that time implies.
//!
//! ## State Transitions
//!
//! ```text
//! NotRunning -start-> Waiting -window opens-> InSession -window closes / end-> PostSession
//!      ^                 ^                                                         |
//!      |                 +--------------------- record outcome --------------------+
//!      +----------------------------- stop (from any running state) ---------------
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut machine = SessionMachine::default();
//! machine.start(&plan, now);
//! // Once per second:
//! for transition in machine.evaluate(&plan, now) { /* react */ }
//! ```

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::window::{SessionPlan, SessionWindow};
use crate::error::SessionError;

/// Which part of the day the user is in.
///
/// `InSession` and `PostSession` remember the calendar day of the window they
/// belong to, so a session left open across midnight is closed against its
/// own window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    NotRunning,
    Waiting,
    InSession { day: NaiveDate },
    PostSession { day: NaiveDate },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NotRunning => "NOT_RUNNING",
            SessionState::Waiting => "WAITING",
            SessionState::InSession { .. } => "IN_SESSION",
            SessionState::PostSession { .. } => "POST_SESSION",
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, SessionState::NotRunning)
    }

    /// Day of the window this state refers to, if any.
    pub fn session_day(&self) -> Option<NaiveDate> {
        match self {
            SessionState::InSession { day } | SessionState::PostSession { day } => Some(*day),
            SessionState::NotRunning | SessionState::Waiting => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::NotRunning
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    Started,
    Stopped,
    Rearmed,
    WindowOpened,
    WindowClosed,
    EndedEarly,
    OutcomeRecorded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub cause: TransitionCause,
}

/// Persistent part of the machine: the current state and the last day whose
/// session has been accounted for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMachine {
    state: SessionState,
    #[serde(default)]
    last_session_date: Option<NaiveDate>,
}

impl SessionMachine {
    pub fn new(state: SessionState, last_session_date: Option<NaiveDate>) -> Self {
        Self {
            state,
            last_session_date,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_session_date(&self) -> Option<NaiveDate> {
        self.last_session_date
    }

    /// The window the current state is about: the open session's own window,
    /// otherwise the one governing `now`.
    pub fn active_window(&self, plan: &SessionPlan, now: NaiveDateTime) -> SessionWindow {
        match self.state.session_day() {
            Some(day) => plan.window_on(day),
            None => plan.window_at(now),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin daily sessions. No-op while already running.
    pub fn start(&mut self, plan: &SessionPlan, now: NaiveDateTime) -> Option<Transition> {
        match self.state {
            SessionState::NotRunning => {
                self.skip_if_window_passed(plan, now);
                Some(self.transition(SessionState::Waiting, TransitionCause::Started))
            }
            SessionState::Waiting
            | SessionState::InSession { .. }
            | SessionState::PostSession { .. } => None,
        }
    }

    /// Return to `Waiting` from any state after the plan changed.
    ///
    /// Clears the processed-day marker, then re-applies the late start rule
    /// against the new plan. Returns `None` if already waiting.
    pub fn rearm(&mut self, plan: &SessionPlan, now: NaiveDateTime) -> Option<Transition> {
        self.last_session_date = None;
        self.skip_if_window_passed(plan, now);
        match self.state {
            SessionState::Waiting => None,
            _ => Some(self.transition(SessionState::Waiting, TransitionCause::Rearmed)),
        }
    }

    /// Stop daily sessions. No-op when not running.
    pub fn stop(&mut self) -> Option<Transition> {
        match self.state {
            SessionState::NotRunning => None,
            _ => Some(self.transition(SessionState::NotRunning, TransitionCause::Stopped)),
        }
    }

    /// User ends the running session before its window closes.
    pub fn end_early(&mut self) -> Result<Transition, SessionError> {
        match self.state {
            SessionState::InSession { day } => Ok(self.transition(
                SessionState::PostSession { day },
                TransitionCause::EndedEarly,
            )),
            other => Err(SessionError::NotAllowed {
                action: "end the session",
                state: other.to_string(),
            }),
        }
    }

    /// User answered the post-session prompt. Returns the day the outcome is for.
    pub fn record_outcome(&mut self) -> Result<(Transition, NaiveDate), SessionError> {
        match self.state {
            SessionState::PostSession { day } => {
                self.last_session_date = Some(day);
                let transition =
                    self.transition(SessionState::Waiting, TransitionCause::OutcomeRecorded);
                Ok((transition, day))
            }
            other => Err(SessionError::NotAllowed {
                action: "record an outcome",
                state: other.to_string(),
            }),
        }
    }

    /// Re-derive the state from the wall clock.
    ///
    /// Runs to a fixed point, so a check that happens after a whole window has
    /// passed still walks `Waiting -> InSession -> PostSession`. Calling it
    /// again with the same inputs yields no transitions.
    pub fn evaluate(&mut self, plan: &SessionPlan, now: NaiveDateTime) -> Vec<Transition> {
        let mut transitions = Vec::new();
        // Each state has at most one time-driven successor; the chain is short.
        for _ in 0..3 {
            match self.step(plan, now) {
                Some(t) => transitions.push(t),
                None => break,
            }
        }
        transitions
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn step(&mut self, plan: &SessionPlan, now: NaiveDateTime) -> Option<Transition> {
        match self.state {
            SessionState::NotRunning | SessionState::PostSession { .. } => None,
            SessionState::Waiting => {
                let window = plan.window_at(now);
                if window.has_started(now) && self.last_session_date != Some(window.day) {
                    Some(self.transition(
                        SessionState::InSession { day: window.day },
                        TransitionCause::WindowOpened,
                    ))
                } else {
                    None
                }
            }
            SessionState::InSession { day } => {
                if plan.window_on(day).has_ended(now) {
                    Some(self.transition(
                        SessionState::PostSession { day },
                        TransitionCause::WindowClosed,
                    ))
                } else {
                    None
                }
            }
        }
    }

    /// A window that is already over when sessions are (re)armed counts as
    /// processed; the first prompt is for the next one.
    fn skip_if_window_passed(&mut self, plan: &SessionPlan, now: NaiveDateTime) {
        let window = plan.window_at(now);
        if window.has_ended(now) {
            self.last_session_date = Some(window.day);
        }
    }

    fn transition(&mut self, to: SessionState, cause: TransitionCause) -> Transition {
        let from = self.state;
        self.state = to;
        tracing::info!(from = %from, to = %to, ?cause, "session state changed");
        Transition { from, to, cause }
    }
}
