use clap::Subcommand;
use workbackwards_core::{local_now, Config, EndTime, SettingsDraft};

use super::{open_controller, print_events, print_json};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the stored settings as JSON
    Show,
    /// Edit settings; unset fields keep their current value
    Set {
        /// Session length in minutes (invalid input falls back to 5)
        #[arg(long)]
        length: Option<String>,
        /// Minutes added after each successful session (invalid input falls back to 1)
        #[arg(long)]
        increment: Option<String>,
        /// Daily end time, HH:MM
        #[arg(long)]
        end: Option<EndTime>,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let now = local_now();
    let mut controller = open_controller(&config, now)?;

    match action {
        SettingsAction::Show => {
            print_json(controller.settings())?;
        }
        SettingsAction::Set {
            length,
            increment,
            end,
        } => {
            let mut draft = SettingsDraft::from_settings(controller.settings());
            if let Some(length) = length {
                draft.session_length = length;
            }
            if let Some(increment) = increment {
                draft.increment = increment;
            }
            if let Some(end) = end {
                draft.end_time = end;
            }
            let events = controller.save_settings(draft.resolve(), now)?;
            print_events(&events)?;
        }
    }
    Ok(())
}
