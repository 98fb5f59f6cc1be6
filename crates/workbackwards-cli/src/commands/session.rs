use clap::Subcommand;
use workbackwards_core::{local_now, Config, Outcome};

use super::{open_controller, print_events};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start daily sessions and install the notifications
    Start,
    /// Stop daily sessions and cancel the notifications
    Stop,
    /// End the running session early
    End,
    /// Record that the session went well
    Yes,
    /// Record that the session did not go well
    No,
    /// Re-evaluate against the clock and print the current state as JSON
    Status,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let now = local_now();
    let mut controller = open_controller(&config, now)?;

    // Reconcile with the clock (and any missed window) before the command.
    let mut events = controller.initialize(now)?;
    let command_events = match action {
        SessionAction::Start => controller.start(now)?,
        SessionAction::Stop => controller.stop(now)?,
        SessionAction::End => controller.end_session(now)?,
        SessionAction::Yes => controller.record_outcome(Outcome::Success, now)?,
        SessionAction::No => controller.record_outcome(Outcome::Failure, now)?,
        SessionAction::Status => Vec::new(),
    };
    events.extend(command_events);
    events.push(controller.snapshot(now));

    print_events(&events)
}
