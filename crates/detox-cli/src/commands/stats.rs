use clap::Subcommand;
use detox_core::detox::HistoryLog;
use detox_core::Config;
use serde_json::json;

use crate::context::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Current streak, longest streak and lifetime total
    Show,
    /// Zero the current streak only
    ResetStreak,
    /// Restore all counters to zero
    Reset,
    /// Monday-to-Sunday completion for the current week
    Week,
}

pub async fn run(action: StatsAction, config: &Config) -> CliResult {
    let mut engine = open_engine(config).await?;

    match action {
        StatsAction::Show => {
            let today = engine.today();
            let stats = engine.stats();
            print_json(&json!({
                "stats": stats,
                "streak_alive": stats.is_streak_alive(today),
            }))?;
        }
        StatsAction::ResetStreak => {
            let previous = engine.reset_streak().await?;
            print_json(&json!({
                "previous_streak": previous,
                "stats": engine.stats(),
            }))?;
        }
        StatsAction::Reset => {
            engine.reset_stats().await?;
            print_json(engine.stats())?;
        }
        StatsAction::Week => {
            let history = HistoryLog::load(engine.store().clone()).await?;
            print_json(&history.weekly_summary(engine.today()))?;
        }
    }
    Ok(())
}
