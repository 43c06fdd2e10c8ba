use detox_core::window::{format_duration, format_time_12h};
use detox_core::Config;
use serde_json::json;

use crate::context::{open_controller, print_json, save_lock_state, CliResult};

pub async fn run(config: &Config) -> CliResult {
    let mut controller = open_controller(config).await?;
    let phase = controller.tick().await?;
    save_lock_state(&controller).await?;
    let events = controller.take_events();

    let engine = controller.engine();
    let settings = engine.settings();
    let remaining = engine.remaining_minutes();
    let attempts_left = controller
        .session()
        .filter(|s| !s.is_released())
        .map(|s| s.attempts_left());

    let status = json!({
        "phase": phase,
        "enabled": settings.enabled,
        "today_active": engine.is_detox_day(),
        "window": {
            "start": settings.start_time,
            "end": settings.end_time,
            "display": format!(
                "{} - {}",
                format_time_12h(&settings.start_time),
                format_time_12h(&settings.end_time)
            ),
        },
        "remaining_minutes": remaining,
        "remaining_label": format_duration(remaining),
        "progress": controller.progress(),
        "bypass_attempts_left": attempts_left,
        "current_streak": engine.stats().current_streak,
        "events": events,
    });
    print_json(&status)
}
