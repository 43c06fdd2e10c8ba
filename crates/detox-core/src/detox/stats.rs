use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimal streak counters. No per-day ledger is kept here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetoxStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_detox_days: u32,
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
}

/// How a completion call moved the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// `today` was already counted; nothing changed.
    AlreadyCompleted,
    /// Yesterday was completed, the streak grew by one.
    Continued,
    /// First completion or a broken streak; the streak restarted at 1.
    Started,
}

impl DetoxStats {
    /// Counters after completing `today`.
    pub fn after_completion(&self, today: NaiveDate) -> (DetoxStats, CompletionOutcome) {
        if self.last_completed_date == Some(today) {
            return (self.clone(), CompletionOutcome::AlreadyCompleted);
        }

        let yesterday = today.pred_opt();
        let (current_streak, outcome) = if yesterday.is_some() && self.last_completed_date == yesterday {
            (self.current_streak.saturating_add(1), CompletionOutcome::Continued)
        } else {
            (1, CompletionOutcome::Started)
        };

        let next = DetoxStats {
            current_streak,
            longest_streak: self.longest_streak.max(current_streak),
            total_detox_days: self.total_detox_days.saturating_add(1),
            last_completed_date: Some(today),
        };
        (next, outcome)
    }

    /// Counters with only the current streak zeroed.
    pub fn with_streak_reset(&self) -> DetoxStats {
        DetoxStats {
            current_streak: 0,
            ..self.clone()
        }
    }

    /// Whether the streak is still alive as of `today` (completed today or yesterday).
    pub fn is_streak_alive(&self, today: NaiveDate) -> bool {
        match self.last_completed_date {
            Some(last) => self.current_streak > 0 && (last == today || Some(last) == today.pred_opt()),
            None => false,
        }
    }
}
