//! Local wall-clock source.
//!
//! The detox window and the streak calendar both run on local time, so the
//! clock hands out naive local date-times. Tests swap in [`FixedClock`].

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use std::sync::{Arc, Mutex};

use super::time_of_day::TimeOfDay;

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Clock fixed at `date` `hour:minute`.
    ///
    /// # Panics
    /// Panics on an out-of-range hour or minute.
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let now = date
            .and_hms_opt(hour, minute, 0)
            .expect("valid hour and minute");
        Self::new(now)
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Current local time of day, truncated to the minute.
pub fn current_time(clock: &dyn Clock) -> TimeOfDay {
    let now = clock.now();
    TimeOfDay::from_minutes(now.hour() * 60 + now.minute())
}

/// Current local calendar date.
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.now().date()
}
