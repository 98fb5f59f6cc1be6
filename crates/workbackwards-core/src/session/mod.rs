mod countdown;
mod machine;
mod streak;
mod window;

pub use countdown::{Countdown, CountdownTarget};
pub use machine::{SessionMachine, SessionState, Transition, TransitionCause};
pub use streak::{Outcome, StreakProgress, DEFAULT_INCREMENT_MIN, DEFAULT_SESSION_LENGTH_MIN};
pub use window::{EndTime, SessionPlan, SessionWindow, MIN_SESSION_LENGTH_MIN};
