use detox_core::Config;
use serde_json::json;

use crate::context::{open_controller, print_json, save_lock_state, CliResult};

pub async fn run(config: &Config) -> CliResult {
    let mut controller = open_controller(config).await?;
    let outcome = controller.complete().await?;
    save_lock_state(&controller).await?;
    let events = controller.take_events();

    print_json(&json!({
        "outcome": outcome,
        "stats": controller.engine().stats(),
        "events": events,
    }))
}
