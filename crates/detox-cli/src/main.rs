use clap::{Parser, Subcommand};
use detox_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "detox-cli", version, about = "Detox companion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current lock phase and remaining time
    Status,
    /// "I made it": release the lock and count today
    Complete,
    /// One attempt to get past the current lock
    Bypass,
    /// Tick the lock state machine and print events as they happen
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Streak statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Detox window settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// First-run setup of the detox window
    Onboard {
        /// Window start, HH:MM
        #[arg(long)]
        start: String,
        /// Window end, HH:MM
        #[arg(long)]
        end: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async move {
        match cli.command {
            Commands::Status => commands::status::run(&config).await,
            Commands::Complete => commands::complete::run(&config).await,
            Commands::Bypass => commands::bypass::run(&config).await,
            Commands::Watch { ticks } => commands::watch::run(&config, ticks).await,
            Commands::Stats { action } => commands::stats::run(action, &config).await,
            Commands::Settings { action } => commands::settings::run(action, &config).await,
            Commands::Config { action } => commands::config::run(action),
            Commands::Onboard { start, end } => commands::onboard::run(&config, &start, &end).await,
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
