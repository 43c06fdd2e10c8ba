use detox_core::{onboarding, Config};
use serde_json::json;

use crate::context::{open_engine, print_json, CliResult};

pub async fn run(config: &Config, start: &str, end: &str) -> CliResult {
    let mut engine = open_engine(config).await?;
    if onboarding::is_completed(engine.store().as_ref()).await? {
        tracing::info!("onboarding already completed, updating the window");
    }

    let settings = onboarding::complete(&mut engine, start, end).await?;
    print_json(&json!({
        "onboarding_completed": true,
        "settings": settings,
    }))
}
