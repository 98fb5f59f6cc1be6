//! Streak and session-length adaptation.
//!
//! Each recorded outcome moves the pair `(streak, session length)`:
//! a success extends the streak and grows the next session by the configured
//! increment, a failure resets both to their starting values. There is no
//! upper bound on session length; additions saturate instead of overflowing.

use serde::{Deserialize, Serialize};

/// Session length restored after any failed session.
pub const DEFAULT_SESSION_LENGTH_MIN: u32 = 5;

/// Daily increment used when none (or an invalid one) is configured.
pub const DEFAULT_INCREMENT_MIN: u32 = 1;

/// What the user reported after a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// The adaptive part of the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakProgress {
    pub streak: u32,
    pub session_length_min: u32,
}

impl Default for StreakProgress {
    fn default() -> Self {
        Self {
            streak: 0,
            session_length_min: DEFAULT_SESSION_LENGTH_MIN,
        }
    }
}

impl StreakProgress {
    /// Apply one outcome.
    ///
    /// The reset length on failure is fixed and independent of `increment_min`.
    pub fn apply(self, outcome: Outcome, increment_min: u32) -> Self {
        match outcome {
            Outcome::Success => Self {
                streak: self.streak.saturating_add(1),
                session_length_min: self.session_length_min.saturating_add(increment_min),
            },
            Outcome::Failure => Self::default(),
        }
    }

    /// One-line summary of what changed, for display after an outcome.
    pub fn explain_change(&self, after: &StreakProgress) -> String {
        if after.streak > self.streak {
            format!(
                "Streak increased to {}! Next session: {} minutes.",
                after.streak, after.session_length_min
            )
        } else if self.streak > 0 || self.session_length_min != after.session_length_min {
            format!(
                "Streak reset from {}. Next session back to {} minutes.",
                self.streak, after.session_length_min
            )
        } else {
            format!(
                "Streak unchanged. Next session remains {} minutes.",
                after.session_length_min
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn success_adds_increment() {
        let before = StreakProgress {
            streak: 2,
            session_length_min: 7,
        };
        let after = before.apply(Outcome::Success, 3);
        assert_eq!(after.streak, 3);
        assert_eq!(after.session_length_min, 10);
    }

    #[test]
    fn failure_resets_to_default_regardless_of_increment() {
        let before = StreakProgress {
            streak: 40,
            session_length_min: 125,
        };
        let after = before.apply(Outcome::Failure, 9);
        assert_eq!(after, StreakProgress::default());
        assert_eq!(after.session_length_min, DEFAULT_SESSION_LENGTH_MIN);
    }

    #[test]
    fn growth_saturates_instead_of_overflowing() {
        let before = StreakProgress {
            streak: u32::MAX,
            session_length_min: u32::MAX - 1,
        };
        let after = before.apply(Outcome::Success, 10);
        assert_eq!(after.streak, u32::MAX);
        assert_eq!(after.session_length_min, u32::MAX);
    }

    #[test]
    fn explain_change_messages() {
        let start = StreakProgress::default();
        let up = start.apply(Outcome::Success, 2);
        assert_eq!(
            start.explain_change(&up),
            "Streak increased to 1! Next session: 7 minutes."
        );
        let down = up.apply(Outcome::Failure, 2);
        assert_eq!(
            up.explain_change(&down),
            "Streak reset from 1. Next session back to 5 minutes."
        );
        assert_eq!(
            start.explain_change(&start.apply(Outcome::Failure, 2)),
            "Streak unchanged. Next session remains 5 minutes."
        );
    }

    #[test]
    fn outcome_from_bool() {
        assert_eq!(Outcome::from_success(true), Outcome::Success);
        assert!(!Outcome::from_success(false).is_success());
    }

    proptest! {
        #[test]
        fn n_successes_grow_linearly(n in 0u32..500, k in 1u32..120) {
            let mut progress = StreakProgress::default();
            for _ in 0..n {
                progress = progress.apply(Outcome::Success, k);
            }
            prop_assert_eq!(progress.streak, n);
            prop_assert_eq!(progress.session_length_min, DEFAULT_SESSION_LENGTH_MIN + n * k);
        }

        #[test]
        fn failure_always_resets(streak in 0u32..10_000, length in 1u32..10_000, k in 1u32..500) {
            let progress = StreakProgress { streak, session_length_min: length };
            let after = progress.apply(Outcome::Failure, k);
            prop_assert_eq!(after.streak, 0);
            prop_assert_eq!(after.session_length_min, 5);
        }
    }
}
