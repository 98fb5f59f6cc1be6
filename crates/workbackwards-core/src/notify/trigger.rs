use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Start,
    End,
}

/// What the user sees when a trigger fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    /// Screen the front end should open when the notification is tapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
}

impl NotificationContent {
    pub fn default_for(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Start => Self {
                title: "Time to Work on Posture!".into(),
                body: "Maintain good posture for the next period!".into(),
                kind,
                screen: None,
            },
            NotificationKind::End => Self {
                title: "Posture Session Complete!".into(),
                body: "Time to log your progress".into(),
                kind,
                screen: Some("index".into()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Repeats every day at hour:minute.
    Daily { hour: u32, minute: u32 },
    /// Fires once, `delay_secs` after it was scheduled.
    Once { delay_secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// A trigger the notifier has accepted and not yet dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: String,
    pub content: NotificationContent,
    pub trigger: Trigger,
    pub created_at: NaiveDateTime,
}

impl ScheduledNotification {
    /// First firing strictly after `after`, if there is one.
    pub fn next_fire_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.trigger {
            Trigger::Daily { hour, minute } => {
                let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
                let today = after.date().and_time(time);
                if today > after {
                    Some(today)
                } else {
                    Some(today + Duration::days(1))
                }
            }
            Trigger::Once { delay_secs } => {
                let fire_at = self.created_at + Duration::seconds(delay_secs as i64);
                (fire_at > after).then_some(fire_at)
            }
        }
    }

    /// Whether the trigger fired in `(since, now]`.
    pub fn fires_within(&self, since: NaiveDateTime, now: NaiveDateTime) -> bool {
        self.next_fire_after(since).is_some_and(|at| at <= now)
    }

    pub fn is_one_shot(&self) -> bool {
        matches!(self.trigger, Trigger::Once { .. })
    }
}
