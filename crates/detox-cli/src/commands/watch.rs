use std::time::Duration;

use detox_core::Config;

use crate::context::{open_controller, save_lock_state, CliResult};

/// Tick every `lock.tick_interval_secs`, printing each event as a JSON line.
pub async fn run(config: &Config, ticks: Option<u64>) -> CliResult {
    let mut controller = open_controller(config).await?;
    let period = Duration::from_secs(config.lock.tick_interval_secs.max(1));
    let mut interval = tokio::time::interval(period);
    tracing::info!(interval_secs = period.as_secs(), "watching detox window");

    let mut done = 0u64;
    loop {
        if ticks.is_some_and(|limit| done >= limit) {
            break;
        }
        interval.tick().await;
        let phase = controller.tick().await?;
        tracing::debug!(?phase, "tick");
        for event in controller.take_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
        save_lock_state(&controller).await?;
        done += 1;
    }
    Ok(())
}
