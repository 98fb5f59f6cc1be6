use clap::Subcommand;
use serde::Serialize;
use serde_json::json;
use workbackwards_core::{local_now, Config, Notifier, ScheduledNotification};

use super::{open_controller, print_events, print_json};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// List pending triggers with their next firing time
    List,
    /// Whether any trigger is pending
    Pending,
    /// Cancel everything and install the start and end triggers again
    Reschedule,
    /// Cancel every pending trigger
    Clear,
    /// Show the notification permission status
    Permission,
}

#[derive(Serialize)]
struct PendingEntry {
    #[serde(flatten)]
    notification: ScheduledNotification,
    next_fire: Option<chrono::NaiveDateTime>,
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let now = local_now();
    let mut controller = open_controller(&config, now)?;

    match action {
        NotifyAction::List => {
            let entries: Vec<PendingEntry> = controller
                .notifier()
                .pending()?
                .into_iter()
                .map(|n| PendingEntry {
                    next_fire: n.next_fire_after(now),
                    notification: n,
                })
                .collect();
            print_json(&entries)?;
        }
        NotifyAction::Pending => {
            let count = controller.notifier().pending()?.len();
            print_json(&json!({ "has_pending": count > 0, "count": count }))?;
        }
        NotifyAction::Reschedule => {
            print_events(&controller.reschedule_notifications(now)?)?;
        }
        NotifyAction::Clear => {
            print_events(&controller.clear_notifications(now)?)?;
        }
        NotifyAction::Permission => {
            let status = controller.request_permission();
            print_json(&json!({ "permission": status }))?;
        }
    }
    Ok(())
}
