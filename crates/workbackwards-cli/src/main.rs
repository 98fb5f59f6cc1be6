use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "workbackwards", version, about = "Work Backwards daily session CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Session length, increment and end time
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Pending notification triggers
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Tick every second until Ctrl+C, printing countdowns and events
    Watch,
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("WORKBACKWARDS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch => commands::watch::run(),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
