use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::notify::{NotificationKind, Trigger};
use crate::session::{EndTime, Outcome, SessionState, SessionWindow, Transition, TransitionCause};

/// Every state change in the system produces an Event.
/// The front end prints them; the watch loop streams them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    StateChanged {
        from: SessionState,
        to: SessionState,
        cause: TransitionCause,
        at: NaiveDateTime,
    },
    OutcomeRecorded {
        day: NaiveDate,
        outcome: Outcome,
        streak: u32,
        session_length_min: u32,
        message: String,
        at: NaiveDateTime,
    },
    NotificationsScheduled {
        start: Trigger,
        end: Trigger,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        at: NaiveDateTime,
    },
    NotificationsCancelled {
        at: NaiveDateTime,
    },
    NotificationFired {
        kind: NotificationKind,
        title: String,
        body: String,
        at: NaiveDateTime,
    },
    /// Notification permission is missing; session features stay inert.
    PermissionDenied {
        at: NaiveDateTime,
    },
    SettingsSaved {
        session_length_min: u32,
        increment_min: u32,
        end_time: EndTime,
        next_start: NaiveDateTime,
        at: NaiveDateTime,
    },
    StateSnapshot {
        state: SessionState,
        streak: u32,
        session_length_min: u32,
        increment_min: u32,
        end_time: EndTime,
        window: SessionWindow,
        countdown: Option<String>,
        countdown_label: Option<String>,
        at: NaiveDateTime,
    },
}

impl Event {
    pub fn from_transition(t: &Transition, at: NaiveDateTime) -> Self {
        Event::StateChanged {
            from: t.from,
            to: t.to,
            cause: t.cause,
            at,
        }
    }
}
