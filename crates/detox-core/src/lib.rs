//! # Detox Core Library
//!
//! Scheduling and streak accounting for the detox companion. The CLI and
//! any GUI shell are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Window**: Pure time-of-day evaluation, including windows that cross
//!   midnight, plus an injectable local [`Clock`]
//! - **Detox**: The streak accounting engine, lock sessions with a bypass
//!   threshold, and an append-only day history
//! - **Storage**: An async JSON key-value store contract with SQLite and
//!   in-memory backends, and TOML configuration
//! - **Timer**: The home-screen focus/break timer
//!
//! ## Key Components
//!
//! - [`DetoxEngine`]: Owns settings and stats; every mutation goes through it
//! - [`DetoxController`]: Tick-driven lock state machine on top of the engine
//! - [`KeyValueStore`]: Persistence seam
//! - [`Config`]: Application configuration management

pub mod detox;
pub mod error;
pub mod events;
pub mod onboarding;
pub mod storage;
pub mod timer;
pub mod window;

pub use detox::{
    BypassOutcome, CompletionOutcome, DayPhase, DetoxController, DetoxEngine, DetoxSettings,
    DetoxStats, LockExitReason, SettingsPatch,
};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use storage::{Config, KeyValueStore, MemoryStore, SqliteStore};
pub use timer::{FocusTimer, Genre};
pub use window::{Clock, DetoxWindow, FixedClock, SystemClock, TimeOfDay};
