//! Application session context.
//!
//! [`SessionController`] owns the settings and routes every user command
//! through the state machine, the notifier and the store. Commands that
//! need notifications wait for the notifier before transitioning. Store
//! failures outside of an explicit settings save are logged and ignored.

use chrono::NaiveDateTime;

use crate::error::{NotificationError, Result};
use crate::events::Event;
use crate::notify::{NotificationScheduler, Notifier, PermissionStatus};
use crate::session::{Countdown, EndTime, Outcome, Transition};
use crate::settings::{Settings, SettingsUpdate};
use crate::storage::KeyValueStore;

pub struct SessionController<S: KeyValueStore, N: Notifier> {
    store: S,
    notifier: N,
    scheduler: NotificationScheduler,
    settings: Settings,
    permission: PermissionStatus,
    last_poll: Option<NaiveDateTime>,
}

impl<S: KeyValueStore, N: Notifier> SessionController<S, N> {
    /// Load settings from `store`. Never fails; see [`Settings::load`].
    pub fn open(
        store: S,
        notifier: N,
        scheduler: NotificationScheduler,
        fallback_end: EndTime,
    ) -> Self {
        let settings = Settings::load(&store, fallback_end);
        tracing::debug!(state = %settings.state(), streak = settings.streak, "settings loaded");
        Self {
            store,
            notifier,
            scheduler,
            settings,
            permission: PermissionStatus::Undetermined,
            last_poll: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    pub fn countdown(&self, now: NaiveDateTime) -> Option<Countdown> {
        let plan = self.settings.plan();
        let window = self.settings.session.active_window(&plan, now);
        Countdown::compute(now, self.settings.state(), &window)
    }

    pub fn snapshot(&self, now: NaiveDateTime) -> Event {
        let plan = self.settings.plan();
        let countdown = self.countdown(now);
        Event::StateSnapshot {
            state: self.settings.state(),
            streak: self.settings.streak,
            session_length_min: self.settings.session_length_min,
            increment_min: self.settings.increment_min,
            end_time: self.settings.end_time,
            window: self.settings.session.active_window(&plan, now),
            countdown: countdown.map(|c| c.to_string()),
            countdown_label: countdown.map(|c| c.label().to_string()),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Request permission, restore missing triggers, then re-evaluate.
    pub fn initialize(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        if !self.request_permission().is_granted() {
            events.push(Event::PermissionDenied { at: now });
        } else if self.settings.state().is_running() && !self.notifier.has_pending()? {
            tracing::info!("sessions running without pending notifications, reinstalling");
            events.push(self.reschedule(now)?);
        }
        events.extend(self.tick(now));
        Ok(events)
    }

    /// Begin daily sessions. Notifications are installed before the state
    /// moves; without permission nothing changes.
    pub fn start(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        if self.settings.state().is_running() {
            return Ok(Vec::new());
        }
        self.ensure_permission()?;
        let mut events = vec![self.reschedule(now)?];

        let plan = self.settings.plan();
        if let Some(t) = self.settings.session.start(&plan, now) {
            events.push(Event::from_transition(&t, now));
        }
        self.persist();
        events.extend(self.tick(now));
        Ok(events)
    }

    /// Cancel notifications and stop. Cancelling happens even when already stopped.
    pub fn stop(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.scheduler.cancel(&self.notifier)?;
        let mut events = vec![Event::NotificationsCancelled { at: now }];
        if let Some(t) = self.settings.session.stop() {
            events.push(Event::from_transition(&t, now));
            self.persist();
        }
        Ok(events)
    }

    /// End the running session before its window closes.
    pub fn end_session(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        let t = self.settings.session.end_early()?;
        self.persist();
        Ok(vec![Event::from_transition(&t, now)])
    }

    /// Answer the post-session prompt and adapt the streak.
    ///
    /// The session length changes with every outcome, so the start trigger
    /// is reinstalled as well; failing to do so is logged, not returned.
    pub fn record_outcome(
        &mut self,
        outcome: Outcome,
        now: NaiveDateTime,
    ) -> Result<Vec<Event>> {
        let (t, day) = self.settings.session.record_outcome()?;
        let (before, after) = self.settings.update_streak(outcome);
        self.persist();

        let mut events = vec![
            Event::from_transition(&t, now),
            Event::OutcomeRecorded {
                day,
                outcome,
                streak: after.streak,
                session_length_min: after.session_length_min,
                message: before.explain_change(&after),
                at: now,
            },
        ];
        if self.permission.is_granted() || self.request_permission().is_granted() {
            match self.reschedule(now) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(error = %e, "failed to reschedule after outcome"),
            }
        }
        events.extend(self.tick(now));
        Ok(events)
    }

    /// Periodic re-evaluation. Persists only when something changed.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Event> {
        let plan = self.settings.plan();
        let transitions: Vec<Transition> = self.settings.session.evaluate(&plan, now);
        if transitions.is_empty() {
            tracing::debug!(state = %self.settings.state(), "tick");
            return Vec::new();
        }
        self.persist();
        transitions
            .iter()
            .map(|t| Event::from_transition(t, now))
            .collect()
    }

    /// Re-read the settings from the store.
    ///
    /// Long-lived callers do this before each tick so that commands run by
    /// other processes against the same store are seen; otherwise the next
    /// persisted transition would write the stale copy back over them.
    pub fn reload(&mut self) {
        let fallback_end = self.settings.end_time;
        self.settings = Settings::load(&self.store, fallback_end);
    }

    /// Apply edited settings, return to `Waiting` and reinstall notifications.
    ///
    /// Unlike other writes, a failed store write is returned to the caller.
    pub fn save_settings(
        &mut self,
        update: SettingsUpdate,
        now: NaiveDateTime,
    ) -> Result<Vec<Event>> {
        self.settings.apply_update(&update);
        let plan = self.settings.plan();
        let transition = self.settings.session.rearm(&plan, now);
        self.settings.save(&self.store)?;

        let mut events = Vec::new();
        if let Some(t) = transition {
            events.push(Event::from_transition(&t, now));
        }
        self.ensure_permission()?;
        events.push(self.reschedule(now)?);
        events.push(Event::SettingsSaved {
            session_length_min: self.settings.session_length_min,
            increment_min: self.settings.increment_min,
            end_time: self.settings.end_time,
            next_start: plan.window_at(now).next_start_after(now),
            at: now,
        });
        events.extend(self.tick(now));
        Ok(events)
    }

    /// Notifications that fired since the previous poll. The first poll only
    /// sets the baseline.
    pub fn poll_fired(&mut self, now: NaiveDateTime) -> Vec<Event> {
        let Some(since) = self.last_poll.replace(now) else {
            return Vec::new();
        };
        if since >= now {
            return Vec::new();
        }
        match self.scheduler.poll_fired(&self.notifier, since, now) {
            Ok(fired) => fired
                .into_iter()
                .map(|n| Event::NotificationFired {
                    kind: n.content.kind,
                    title: n.content.title,
                    body: n.content.body,
                    at: now,
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll notifications");
                Vec::new()
            }
        }
    }

    /// Reinstall both triggers for the current plan, whatever the state.
    pub fn reschedule_notifications(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.ensure_permission()?;
        Ok(vec![self.reschedule(now)?])
    }

    /// Drop every pending trigger without touching the session state.
    /// A running session gets them back on the next [`initialize`](Self::initialize).
    pub fn clear_notifications(&mut self, now: NaiveDateTime) -> Result<Vec<Event>> {
        self.scheduler.cancel(&self.notifier)?;
        Ok(vec![Event::NotificationsCancelled { at: now }])
    }

    /// Ask the notifier again. Idempotent.
    pub fn request_permission(&mut self) -> PermissionStatus {
        self.permission = match self.notifier.request_permission() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "permission request failed");
                PermissionStatus::Denied
            }
        };
        if !self.permission.is_granted() {
            tracing::warn!("notification permissions not granted");
        }
        self.permission
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_permission(&mut self) -> Result<(), NotificationError> {
        if self.permission.is_granted() || self.request_permission().is_granted() {
            Ok(())
        } else {
            Err(NotificationError::PermissionDenied)
        }
    }

    fn reschedule(&mut self, now: NaiveDateTime) -> Result<Event, NotificationError> {
        let pair = self
            .scheduler
            .reschedule(&self.notifier, &self.settings.plan(), now)?;
        Ok(Event::NotificationsScheduled {
            start: pair.start,
            end: pair.end,
            window_start: pair.window.start,
            window_end: pair.window.end,
            at: now,
        })
    }

    fn persist(&self) {
        if let Err(e) = self.settings.save(&self.store) {
            tracing::warn!(error = %e, "failed to persist settings");
        }
    }
}
