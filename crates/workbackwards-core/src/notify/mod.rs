//! Notification port, its implementations and the scheduling policy.

mod notifier;
mod scheduler;
mod trigger;

pub use notifier::{MemoryNotifier, Notifier, SqliteNotifier};
pub use scheduler::{triggers_for, NotificationScheduler, ScheduleMode, ScheduledPair};
pub use trigger::{
    NotificationContent, NotificationKind, PermissionStatus, ScheduledNotification, Trigger,
};
