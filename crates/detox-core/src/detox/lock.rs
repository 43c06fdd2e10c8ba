//! Lock session and bypass policy.
//!
//! A session lives from the moment the clock enters the detox window until
//! it is released. Bypass attempts are counted per session; the attempt
//! that reaches the threshold releases the lock. The caller applies the
//! streak penalty exactly once on that attempt.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::window::{format_duration, DetoxWindow, TimeOfDay};

pub const DEFAULT_BYPASS_THRESHOLD: u32 = 3;

/// Why a lock session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockExitReason {
    /// The window ran out.
    Expired,
    /// The user took the explicit completion action.
    Completed,
    /// The bypass threshold was reached.
    Bypassed,
}

/// Result of one bypass attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BypassOutcome {
    /// Still locked; `remaining` more attempts release it.
    Warned { attempts: u32, remaining: u32 },
    /// This attempt released the lock.
    Released { attempts: u32 },
    /// No lock session was open.
    NotLocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSession {
    pub started_at: NaiveDateTime,
    /// Date the window occurrence opened. For a window crossing midnight
    /// this is the evening's date.
    pub window_date: NaiveDate,
    pub bypass_attempts: u32,
    pub threshold: u32,
    /// How the session was released, if it was. Later attempts are ignored.
    #[serde(default)]
    pub released: Option<LockExitReason>,
}

impl LockSession {
    pub fn new(started_at: NaiveDateTime, window_date: NaiveDate, threshold: u32) -> Self {
        Self {
            started_at,
            window_date,
            bypass_attempts: 0,
            threshold: threshold.max(1),
            released: None,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.is_some()
    }

    pub fn release(&mut self, reason: LockExitReason) {
        self.released.get_or_insert(reason);
    }

    /// Count one bypass attempt.
    pub fn register_bypass(&mut self) -> BypassOutcome {
        if self.is_released() {
            return BypassOutcome::NotLocked;
        }
        self.bypass_attempts += 1;
        if self.bypass_attempts >= self.threshold {
            self.release(LockExitReason::Bypassed);
            BypassOutcome::Released {
                attempts: self.bypass_attempts,
            }
        } else {
            BypassOutcome::Warned {
                attempts: self.bypass_attempts,
                remaining: self.threshold - self.bypass_attempts,
            }
        }
    }

    pub fn attempts_left(&self) -> u32 {
        self.threshold.saturating_sub(self.bypass_attempts)
    }
}

/// Lock-screen countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockProgress {
    pub total_minutes: u32,
    pub remaining_minutes: u32,
    pub elapsed_minutes: u32,
    /// `0.0..=1.0`
    pub fraction: f64,
    /// e.g. `"1h 30m"`
    pub label: String,
}

/// Countdown for `window` at `now`.
pub fn progress(window: &DetoxWindow, now: TimeOfDay) -> LockProgress {
    let total = window.total_minutes();
    let remaining = window.remaining_from(now).min(total);
    LockProgress {
        total_minutes: total,
        remaining_minutes: remaining,
        elapsed_minutes: total - remaining,
        fraction: window.progress_at(now),
        label: format_duration(remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> LockSession {
        let at: NaiveDateTime = "2026-03-10T06:00:00".parse().unwrap();
        LockSession::new(at, at.date(), DEFAULT_BYPASS_THRESHOLD)
    }

    #[test]
    fn third_attempt_releases() {
        let mut s = session();
        assert_eq!(
            s.register_bypass(),
            BypassOutcome::Warned { attempts: 1, remaining: 2 }
        );
        assert_eq!(
            s.register_bypass(),
            BypassOutcome::Warned { attempts: 2, remaining: 1 }
        );
        assert_eq!(s.register_bypass(), BypassOutcome::Released { attempts: 3 });
        assert_eq!(s.register_bypass(), BypassOutcome::NotLocked);
        assert_eq!(s.attempts_left(), 0);
        assert_eq!(s.released, Some(LockExitReason::Bypassed));
    }

    #[test]
    fn first_release_reason_sticks() {
        let mut s = session();
        s.release(LockExitReason::Completed);
        s.release(LockExitReason::Expired);
        assert_eq!(s.released, Some(LockExitReason::Completed));
        assert_eq!(s.register_bypass(), BypassOutcome::NotLocked);
        assert_eq!(s.bypass_attempts, 0);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        let at: NaiveDateTime = "2026-03-10T06:00:00".parse().unwrap();
        let mut s = LockSession::new(at, at.date(), 0);
        assert_eq!(s.register_bypass(), BypassOutcome::Released { attempts: 1 });
    }

    #[test]
    fn progress_mid_window() {
        let window = DetoxWindow::new("06:00".parse().unwrap(), "09:00".parse().unwrap());
        let p = progress(&window, "07:30".parse().unwrap());
        assert_eq!(p.total_minutes, 180);
        assert_eq!(p.remaining_minutes, 90);
        assert_eq!(p.elapsed_minutes, 90);
        assert!((p.fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(p.label, "1h 30m");
    }

    #[test]
    fn progress_overnight() {
        let window = DetoxWindow::new("22:00".parse().unwrap(), "06:00".parse().unwrap());
        let p = progress(&window, "23:30".parse().unwrap());
        assert_eq!(p.total_minutes, 480);
        assert_eq!(p.remaining_minutes, 390);
        assert_eq!(p.label, "6h 30m");
    }

    #[test]
    fn bypass_outcome_wire_format() {
        let json = serde_json::to_value(BypassOutcome::Warned { attempts: 1, remaining: 2 }).unwrap();
        assert_eq!(json["result"], "warned");
        assert_eq!(json["remaining"], 2);
    }
}
