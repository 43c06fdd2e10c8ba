//! Wiring shared by the detox commands.
//!
//! Each invocation is a fresh process, so the open lock session is kept in
//! the store under [`LOCK_STATE_KEY`] between runs.

use std::sync::Arc;

use detox_core::detox::{DetoxController, LockState};
use detox_core::storage::kv::{load_record, save_record};
use detox_core::{Config, CoreError, DetoxEngine, KeyValueStore, SqliteStore, SystemClock};

pub const LOCK_STATE_KEY: &str = "cli_lock_session";

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_store() -> Result<Arc<dyn KeyValueStore>, CoreError> {
    Ok(Arc::new(SqliteStore::open()?))
}

pub async fn open_engine(config: &Config) -> Result<DetoxEngine, CoreError> {
    DetoxEngine::load(open_store()?, Arc::new(SystemClock), config).await
}

/// Engine plus the lock session left by the previous invocation.
pub async fn open_controller(config: &Config) -> Result<DetoxController, CoreError> {
    let engine = open_engine(config).await?;
    let state = load_record::<LockState>(engine.store().as_ref(), LOCK_STATE_KEY)
        .await?
        .unwrap_or_default();
    let mut controller = DetoxController::new(engine, config).await?;
    controller.restore(state);
    Ok(controller)
}

pub async fn save_lock_state(controller: &DetoxController) -> Result<(), CoreError> {
    let store = controller.engine().store().clone();
    save_record(store.as_ref(), LOCK_STATE_KEY, &controller.lock_state()).await?;
    Ok(())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
