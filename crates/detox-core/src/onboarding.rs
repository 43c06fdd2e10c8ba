//! First-run onboarding.
//!
//! The flow asks for a detox window and then marks onboarding as done.
//! Settings are written before the flag, so an interrupted run repeats
//! onboarding instead of skipping it with stale settings.

use serde_json::Value;

use crate::detox::{DetoxEngine, DetoxSettings, SettingsPatch, ALL_DAYS};
use crate::error::{CoreError, StoreError};
use crate::events::Event;
use crate::storage::{keys, KeyValueStore};
use crate::window::TimeOfDay;

/// Whether onboarding finished. Absent or non-boolean values read as `false`.
pub async fn is_completed(store: &dyn KeyValueStore) -> Result<bool, StoreError> {
    match store.get(keys::ONBOARDING_COMPLETED).await? {
        Some(Value::Bool(done)) => Ok(done),
        Some(other) => {
            tracing::warn!(value = %other, "onboarding flag is not a boolean, treating as incomplete");
            Ok(false)
        }
        None => Ok(false),
    }
}

/// Save the chosen window (enabled, every day) and set the flag.
pub async fn complete(
    engine: &mut DetoxEngine,
    start_time: &str,
    end_time: &str,
) -> Result<DetoxSettings, CoreError> {
    let start: TimeOfDay = start_time.parse()?;
    let end: TimeOfDay = end_time.parse()?;

    let settings = engine
        .update_settings(SettingsPatch {
            enabled: Some(true),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            active_days: Some(ALL_DAYS.to_vec()),
        })
        .await?
        .clone();

    engine
        .store()
        .set(keys::ONBOARDING_COMPLETED, Value::Bool(true))
        .await?;

    tracing::info!(start = %settings.start_time, end = %settings.end_time, "onboarding completed");
    engine.push_event(Event::OnboardingCompleted {
        start_time: settings.start_time.clone(),
        end_time: settings.end_time.clone(),
    });
    Ok(settings)
}
