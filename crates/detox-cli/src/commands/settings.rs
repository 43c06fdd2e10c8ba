use clap::Subcommand;
use detox_core::Config;

use crate::context::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the detox window settings
    Show,
    /// Set the window start (HH:MM)
    SetStart { time: String },
    /// Set the window end (HH:MM); earlier than the start means overnight
    SetEnd { time: String },
    /// Add or remove a weekday (Monday = 1 ... Sunday = 7)
    ToggleDay { day: u8 },
    /// Turn the detox window on or off
    ToggleEnabled,
    /// Restore the default window
    Reset,
}

pub async fn run(action: SettingsAction, config: &Config) -> CliResult {
    let mut engine = open_engine(config).await?;

    let settings = match action {
        SettingsAction::Show => engine.settings(),
        SettingsAction::SetStart { time } => engine.set_start_time(&time).await?,
        SettingsAction::SetEnd { time } => engine.set_end_time(&time).await?,
        SettingsAction::ToggleDay { day } => engine.toggle_active_day(day).await?,
        SettingsAction::ToggleEnabled => engine.toggle_enabled().await?,
        SettingsAction::Reset => engine.reset_settings().await?,
    };
    print_json(settings)
}
