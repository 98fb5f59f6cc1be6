//! Remaining-time presenter.
//!
//! Pure function of `(now, state, window)`; it never moves the state machine.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::machine::SessionState;
use super::window::SessionWindow;

/// What the countdown is counting towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownTarget {
    /// End of the running session.
    SessionEnd,
    /// Next occurrence of the session start.
    NextStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub target: CountdownTarget,
    pub target_at: NaiveDateTime,
    /// Never negative.
    pub remaining: Duration,
}

impl Countdown {
    /// `None` while sessions are not running.
    pub fn compute(
        now: NaiveDateTime,
        state: SessionState,
        window: &SessionWindow,
    ) -> Option<Self> {
        let (target, target_at) = match state {
            SessionState::NotRunning => return None,
            SessionState::InSession { .. } => (CountdownTarget::SessionEnd, window.end),
            SessionState::Waiting | SessionState::PostSession { .. } => {
                (CountdownTarget::NextStart, window.next_start_after(now))
            }
        };
        let remaining = (target_at - now).max(Duration::zero());
        Some(Self {
            target,
            target_at,
            remaining,
        })
    }

    /// Label the terminal front end puts before the countdown.
    pub fn label(&self) -> &'static str {
        match self.target {
            CountdownTarget::SessionEnd => "Session time remaining:",
            CountdownTarget::NextStart => "Next session in:",
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.remaining.num_seconds();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        match self.target {
            CountdownTarget::SessionEnd => {
                write!(f, "{}m {}s remaining", total_secs / 60, seconds)
            }
            CountdownTarget::NextStart if hours > 0 => write!(f, "{hours}h {minutes}m"),
            CountdownTarget::NextStart => write!(f, "{minutes}m {seconds}s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::window::{EndTime, SessionPlan};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, s).unwrap()
    }

    fn window() -> SessionWindow {
        SessionPlan::new(EndTime::new(22, 0).unwrap(), 5).window_on(day())
    }

    #[test]
    fn in_session_counts_down_to_end() {
        let state = SessionState::InSession { day: day() };
        let c = Countdown::compute(at(21, 57, 30), state, &window()).unwrap();
        assert_eq!(c.target, CountdownTarget::SessionEnd);
        assert_eq!(c.to_string(), "2m 30s remaining");
    }

    #[test]
    fn in_session_past_end_clamps_to_zero() {
        let state = SessionState::InSession { day: day() };
        let c = Countdown::compute(at(22, 0, 5), state, &window()).unwrap();
        assert_eq!(c.to_string(), "0m 0s remaining");
    }

    #[test]
    fn waiting_more_than_an_hour_shows_hours() {
        let c = Countdown::compute(at(19, 30, 15), SessionState::Waiting, &window()).unwrap();
        assert_eq!(c.target, CountdownTarget::NextStart);
        assert_eq!(c.to_string(), "2h 24m");
    }

    #[test]
    fn waiting_under_an_hour_shows_seconds() {
        let c = Countdown::compute(at(21, 10, 20), SessionState::Waiting, &window()).unwrap();
        assert_eq!(c.to_string(), "44m 40s");
    }

    #[test]
    fn after_start_counts_to_tomorrow() {
        let state = SessionState::PostSession { day: day() };
        let c = Countdown::compute(at(22, 0, 0), state, &window()).unwrap();
        assert_eq!(c.target_at, at(21, 55, 0) + Duration::days(1));
        assert_eq!(c.to_string(), "23h 55m");
    }

    #[test]
    fn not_running_has_no_countdown() {
        assert!(Countdown::compute(at(12, 0, 0), SessionState::NotRunning, &window()).is_none());
    }

    #[test]
    fn labels_match_target() {
        let c = Countdown::compute(at(12, 0, 0), SessionState::Waiting, &window()).unwrap();
        assert_eq!(c.label(), "Next session in:");
    }
}
