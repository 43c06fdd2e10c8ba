use detox_core::{BypassOutcome, Config};
use serde_json::json;

use crate::context::{open_controller, print_json, save_lock_state, CliResult};

pub async fn run(config: &Config) -> CliResult {
    let mut controller = open_controller(config).await?;
    let outcome = controller.bypass().await?;
    save_lock_state(&controller).await?;
    let events = controller.take_events();

    let message = match outcome {
        BypassOutcome::Warned { remaining, .. } => {
            format!("Stay strong. {remaining} more attempt(s) will end your streak.")
        }
        BypassOutcome::Released { .. } => "Lock released. Your streak has been reset.".to_string(),
        BypassOutcome::NotLocked => "No detox window is active right now.".to_string(),
    };

    print_json(&json!({
        "outcome": outcome,
        "message": message,
        "current_streak": controller.engine().stats().current_streak,
        "events": events,
    }))
}
