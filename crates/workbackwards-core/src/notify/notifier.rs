use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::NaiveDateTime;

use super::trigger::{NotificationContent, PermissionStatus, ScheduledNotification, Trigger};
use crate::error::NotificationError;
use crate::storage::Database;

/// Host notification facility.
///
/// Implementations deliver nothing themselves; they keep the pending list
/// that the scheduler and the watch loop read.
pub trait Notifier: Send {
    /// Idempotent. `Denied` leaves session features inert.
    fn request_permission(&self) -> Result<PermissionStatus, NotificationError>;

    /// Install a trigger and return its id.
    fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
        now: NaiveDateTime,
    ) -> Result<String, NotificationError>;

    /// Drop one trigger. Returns whether it existed.
    fn cancel(&self, id: &str) -> Result<bool, NotificationError>;

    fn cancel_all(&self) -> Result<(), NotificationError>;

    fn pending(&self) -> Result<Vec<ScheduledNotification>, NotificationError>;

    fn has_pending(&self) -> Result<bool, NotificationError> {
        Ok(!self.pending()?.is_empty())
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Pending triggers kept in the SQLite `notifications` table so they survive
/// restarts. Permission is granted iff notifications are enabled in config.
pub struct SqliteNotifier {
    db: Database,
    enabled: bool,
}

impl SqliteNotifier {
    pub fn new(db: Database, enabled: bool) -> Self {
        Self { db, enabled }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Notifier for SqliteNotifier {
    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        Ok(if self.enabled {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
        now: NaiveDateTime,
    ) -> Result<String, NotificationError> {
        if !self.enabled {
            return Err(NotificationError::PermissionDenied);
        }
        let n = ScheduledNotification {
            id: new_id(),
            content,
            trigger,
            created_at: now,
        };
        self.db
            .insert_notification(&n)
            .map_err(|e| NotificationError::ScheduleFailed(e.to_string()))?;
        Ok(n.id)
    }

    fn cancel(&self, id: &str) -> Result<bool, NotificationError> {
        Ok(self.db.delete_notification(id)?)
    }

    fn cancel_all(&self) -> Result<(), NotificationError> {
        self.db
            .delete_all_notifications()
            .map_err(|e| NotificationError::CancelFailed(e.to_string()))?;
        Ok(())
    }

    fn pending(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        Ok(self.db.list_notifications()?)
    }
}

/// In-process notifier for tests and headless runs.
#[derive(Debug)]
pub struct MemoryNotifier {
    permission: PermissionStatus,
    pending: Mutex<Vec<ScheduledNotification>>,
    fail_schedule: AtomicBool,
    /// Successful `schedule` calls left before they start failing.
    schedule_budget: AtomicUsize,
}

impl MemoryNotifier {
    pub fn granted() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn denied() -> Self {
        Self::with_permission(PermissionStatus::Denied)
    }

    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            permission,
            pending: Mutex::new(Vec::new()),
            fail_schedule: AtomicBool::new(false),
            schedule_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Make every following `schedule` call fail.
    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    /// Let `successes` more `schedule` calls through, then fail the rest.
    pub fn fail_schedule_after(&self, successes: usize) {
        self.schedule_budget.store(successes, Ordering::SeqCst);
    }

    fn take_schedule_budget(&self) -> bool {
        self.schedule_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Vec<ScheduledNotification>>, NotificationError> {
        self.pending
            .lock()
            .map_err(|e| NotificationError::ScheduleFailed(e.to_string()))
    }
}

impl Notifier for MemoryNotifier {
    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        Ok(self.permission)
    }

    fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
        now: NaiveDateTime,
    ) -> Result<String, NotificationError> {
        if !self.permission.is_granted() {
            return Err(NotificationError::PermissionDenied);
        }
        if self.fail_schedule.load(Ordering::SeqCst) || !self.take_schedule_budget() {
            return Err(NotificationError::ScheduleFailed("backend unavailable".into()));
        }
        let n = ScheduledNotification {
            id: new_id(),
            content,
            trigger,
            created_at: now,
        };
        let id = n.id.clone();
        self.lock()?.push(n);
        Ok(id)
    }

    fn cancel(&self, id: &str) -> Result<bool, NotificationError> {
        let mut pending = self.lock()?;
        let before = pending.len();
        pending.retain(|n| n.id != id);
        Ok(pending.len() != before)
    }

    fn cancel_all(&self) -> Result<(), NotificationError> {
        self.lock()?.clear();
        Ok(())
    }

    fn pending(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        Ok(self.lock()?.clone())
    }
}

impl<T: Notifier + Sync> Notifier for std::sync::Arc<T> {
    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        (**self).request_permission()
    }

    fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
        now: NaiveDateTime,
    ) -> Result<String, NotificationError> {
        (**self).schedule(content, trigger, now)
    }

    fn cancel(&self, id: &str) -> Result<bool, NotificationError> {
        (**self).cancel(id)
    }

    fn cancel_all(&self) -> Result<(), NotificationError> {
        (**self).cancel_all()
    }

    fn pending(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        (**self).pending()
    }
}
