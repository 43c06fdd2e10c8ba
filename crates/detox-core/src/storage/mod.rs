mod config;
pub mod kv;
pub mod sqlite;

pub use config::{Config, ExpiryPolicy, LockConfig, LoggingConfig, PersistenceConfig, TimerConfig, WritePolicy};
pub use kv::{KeyValueStore, MemoryStore};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

/// Persistence keys shared with the key-value store.
pub mod keys {
    /// `bool`, written by the onboarding flow.
    pub const ONBOARDING_COMPLETED: &str = "onboarding_completed";
    /// `DetoxSettings` record.
    pub const DETOX_SETTINGS: &str = "detox_settings";
    /// `DetoxStats` record.
    pub const DETOX_STATS: &str = "detox_stats";
    /// Append-only array of `DetoxDayHistory`. Never read by the streak engine.
    pub const DETOX_HISTORY: &str = "detox_history";
}

/// Returns the data directory, creating it if needed.
///
/// `DETOX_DATA_DIR` wins when set. Otherwise `~/.config/detox-companion[-dev]/`
/// based on `DETOX_ENV` (set `DETOX_ENV=dev` for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("DETOX_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("DETOX_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("detox-companion-dev")
            } else {
                base_dir.join("detox-companion")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
