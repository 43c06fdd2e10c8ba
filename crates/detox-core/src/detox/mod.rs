//! Detox scheduling and streak accounting.

mod controller;
mod engine;
mod history;
mod lock;
mod settings;
mod stats;

pub use controller::{DetoxController, LockState};
pub use engine::{DayPhase, DetoxEngine};
pub use history::{DaySummary, DetoxDayHistory, HistoryLog, WeeklySummary};
pub use lock::{
    progress, BypassOutcome, LockExitReason, LockProgress, LockSession, DEFAULT_BYPASS_THRESHOLD,
};
pub use settings::{DetoxSettings, SettingsPatch, ALL_DAYS};
pub use stats::{CompletionOutcome, DetoxStats};
