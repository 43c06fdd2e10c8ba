use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detox::{CompletionOutcome, DetoxSettings, LockExitReason};
use crate::timer::{Genre, TimerPhase};

/// Every state change in the system produces an Event.
/// The UI drains them after each action or tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    DetoxDayCompleted {
        date: NaiveDate,
        outcome: CompletionOutcome,
        current_streak: u32,
        longest_streak: u32,
        total_detox_days: u32,
    },
    StreakReset {
        previous_streak: u32,
    },
    StatsReset,
    SettingsUpdated {
        settings: DetoxSettings,
    },
    OnboardingCompleted {
        start_time: String,
        end_time: String,
    },
    /// The clock entered the configured window on an active day.
    LockEntered {
        start_time: String,
        end_time: String,
        remaining_minutes: u32,
        at: NaiveDateTime,
    },
    LockExited {
        reason: LockExitReason,
        bypass_attempts: u32,
        at: NaiveDateTime,
    },
    /// A bypass attempt that did not yet release the lock.
    BypassAttempted {
        attempts: u32,
        remaining: u32,
        at: NaiveDateTime,
    },
    /// A durable write failed. `committed` tells whether the in-memory
    /// record moved ahead of the store anyway.
    PersistFailed {
        key: String,
        message: String,
        committed: bool,
    },
    TimerStarted {
        phase: TimerPhase,
        genre: Genre,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: TimerPhase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPhaseCompleted {
        completed: TimerPhase,
        next: TimerPhase,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let json = serde_json::to_value(Event::StreakReset { previous_streak: 4 }).unwrap();
        assert_eq!(json["type"], "streak_reset");
        assert_eq!(json["previous_streak"], 4);

        let json = serde_json::to_value(Event::StatsReset).unwrap();
        assert_eq!(json["type"], "stats_reset");
    }
}
