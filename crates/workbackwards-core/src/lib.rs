//! # Workbackwards Core Library
//!
//! Core logic for a daily "work backwards" session: a short habit session
//! that ends at a fixed time of day and grows by a few minutes every time
//! it is completed. All operations are available through the standalone
//! `workbackwards` CLI; this crate holds everything the CLI drives.
//!
//! ## Architecture
//!
//! - **Session**: a wall-clock, level-triggered state machine. The caller
//!   invokes [`SessionController::tick`] periodically; state is always
//!   re-derived from the current time and the persisted day marker.
//! - **Notify**: the two daily reminders (session start and end), installed
//!   through the [`Notifier`] port.
//! - **Storage**: typed JSON values in SQLite behind [`KeyValueStore`], and
//!   TOML configuration.
//!
//! ## Key Components
//!
//! - [`SessionController`]: routes user commands and ticks
//! - [`SessionMachine`]: the four-state session lifecycle
//! - [`StreakProgress`]: streak and adaptive session length
//! - [`NotificationScheduler`]: cancel-then-reschedule of the two triggers
//! - [`Ticker`]: cancellable periodic tick

pub mod controller;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod settings;
pub mod storage;
pub mod ticker;

pub use controller::SessionController;
pub use error::{
    ConfigError, CoreError, NotificationError, SessionError, StorageError, ValidationError,
};
pub use events::Event;
pub use notify::{
    MemoryNotifier, NotificationContent, NotificationKind, NotificationScheduler, Notifier,
    PermissionStatus, ScheduleMode, ScheduledNotification, SqliteNotifier, Trigger,
};
pub use session::{
    Countdown, CountdownTarget, EndTime, Outcome, SessionMachine, SessionPlan, SessionState,
    SessionWindow, StreakProgress, Transition, TransitionCause,
};
pub use settings::{Settings, SettingsDraft, SettingsUpdate};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use ticker::Ticker;

/// Current local wall-clock time. Every time-dependent operation takes `now`
/// explicitly; front ends call this once per command or tick.
pub fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
