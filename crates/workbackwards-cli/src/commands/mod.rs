pub mod completions;
pub mod config;
pub mod notify;
pub mod session;
pub mod settings;
pub mod watch;

use chrono::NaiveDateTime;
use workbackwards_core::{Config, Database, Event, SessionController, SqliteNotifier};

pub type Controller = SessionController<Database, SqliteNotifier>;

/// Open the controller over the on-disk database. The store and the notifier
/// each get their own connection.
pub fn open_controller(
    config: &Config,
    now: NaiveDateTime,
) -> Result<Controller, Box<dyn std::error::Error>> {
    let store = Database::open()?;
    let notifier = SqliteNotifier::new(Database::open()?, config.notifications.enabled);
    Ok(SessionController::open(
        store,
        notifier,
        config.scheduler(),
        config.default_end_time(now),
    ))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        print_json(event)?;
    }
    Ok(())
}
