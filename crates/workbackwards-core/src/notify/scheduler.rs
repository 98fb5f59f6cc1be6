//! Trigger derivation and the cancel-then-install reschedule policy.
//!
//! Every reschedule clears the notifier first and then installs exactly one
//! start and one end trigger, so at most two are ever pending.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::notifier::Notifier;
use super::trigger::{NotificationContent, NotificationKind, ScheduledNotification, Trigger};
use crate::error::NotificationError;
use crate::session::{SessionPlan, SessionWindow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Two repeating hour:minute triggers.
    #[default]
    Daily,
    /// Two relative-delay triggers for the next occurrence of each time.
    OneShot,
}

/// The pair installed by a reschedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPair {
    pub start_id: String,
    pub end_id: String,
    pub start: Trigger,
    pub end: Trigger,
    /// Today's window the triggers were derived from.
    pub window: SessionWindow,
}

/// Derive the start and end triggers for today's window.
///
/// In one-shot mode a time already behind `now` is rolled to the next day
/// before the delay is taken.
pub fn triggers_for(
    window: &SessionWindow,
    mode: ScheduleMode,
    now: NaiveDateTime,
) -> (Trigger, Trigger) {
    match mode {
        ScheduleMode::Daily => (daily_at(window.start), daily_at(window.end)),
        ScheduleMode::OneShot => (once_until(window.start, now), once_until(window.end, now)),
    }
}

fn daily_at(at: NaiveDateTime) -> Trigger {
    Trigger::Daily {
        hour: at.hour(),
        minute: at.minute(),
    }
}

fn once_until(mut at: NaiveDateTime, now: NaiveDateTime) -> Trigger {
    while at < now {
        at += Duration::days(1);
    }
    Trigger::Once {
        delay_secs: (at - now).num_seconds().max(0) as u64,
    }
}

#[derive(Debug, Clone)]
pub struct NotificationScheduler {
    mode: ScheduleMode,
    start_content: NotificationContent,
    end_content: NotificationContent,
}

impl Default for NotificationScheduler {
    fn default() -> Self {
        Self::new(ScheduleMode::Daily)
    }
}

impl NotificationScheduler {
    pub fn new(mode: ScheduleMode) -> Self {
        Self {
            mode,
            start_content: NotificationContent::default_for(NotificationKind::Start),
            end_content: NotificationContent::default_for(NotificationKind::End),
        }
    }

    pub fn with_content(mut self, start: NotificationContent, end: NotificationContent) -> Self {
        self.start_content = start;
        self.end_content = end;
        self
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// Cancel everything pending, then install the start and end triggers.
    pub fn reschedule<N: Notifier + ?Sized>(
        &self,
        notifier: &N,
        plan: &SessionPlan,
        now: NaiveDateTime,
    ) -> Result<ScheduledPair, NotificationError> {
        notifier.cancel_all()?;

        let window = plan.window_on(now.date());
        let (start, end) = triggers_for(&window, self.mode, now);
        let start_id = notifier.schedule(self.start_content.clone(), start, now)?;
        let end_id = match notifier.schedule(self.end_content.clone(), end, now) {
            Ok(id) => id,
            Err(e) => {
                // Never leave half a pair installed.
                if let Err(cancel_err) = notifier.cancel_all() {
                    tracing::warn!(error = %cancel_err, "failed to roll back start trigger");
                }
                return Err(e);
            }
        };

        tracing::info!(
            session_length = plan.length_min(),
            start = %window.start.format("%H:%M"),
            end = %window.end.format("%H:%M"),
            mode = ?self.mode,
            "notifications scheduled"
        );

        Ok(ScheduledPair {
            start_id,
            end_id,
            start,
            end,
            window,
        })
    }

    pub fn cancel<N: Notifier + ?Sized>(&self, notifier: &N) -> Result<(), NotificationError> {
        notifier.cancel_all()?;
        tracing::info!("notifications cancelled");
        Ok(())
    }

    /// Triggers that fired in `(since, now]`. Fired one-shot triggers are
    /// removed from the notifier.
    pub fn poll_fired<N: Notifier + ?Sized>(
        &self,
        notifier: &N,
        since: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<Vec<ScheduledNotification>, NotificationError> {
        let fired: Vec<_> = notifier
            .pending()?
            .into_iter()
            .filter(|n| n.fires_within(since, now))
            .collect();
        for n in fired.iter().filter(|n| n.is_one_shot()) {
            notifier.cancel(&n.id)?;
        }
        Ok(fired)
    }
}
