use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A wall-clock time of day with minute precision.
///
/// Parses from and serializes to the 24-hour `"HH:MM"` form used by the
/// persisted settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build a time of day, rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::InvalidTime {
                value: format!("{hour:02}:{minute:02}"),
                reason: "hour must be within 0..=23".into(),
            });
        }
        if minute > 59 {
            return Err(ValidationError::InvalidTime {
                value: format!("{hour:02}:{minute:02}"),
                reason: "minute must be within 0..=59".into(),
            });
        }
        Ok(Self { hour, minute })
    }

    /// Rebuild from a minute-of-day value. Values past midnight wrap.
    pub fn from_minutes(minutes: u32) -> Self {
        let m = minutes % MINUTES_PER_DAY;
        Self {
            hour: (m / 60) as u8,
            minute: (m % 60) as u8,
        }
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes since midnight, `0..=1439`.
    pub fn minutes(self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    /// 12-hour rendering, e.g. `6:00 AM`, `12:05 AM`, `9:30 PM`.
    pub fn to_12h(self) -> String {
        let period = if self.hour >= 12 { "PM" } else { "AM" };
        let display_hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{}:{:02} {}", display_hour, self.minute, period)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidTime {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (h, m) = s.split_once(':').ok_or_else(|| invalid("expected HH:MM"))?;
        let is_part = |p: &str| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit());
        if !is_part(h) || !is_part(m) {
            return Err(invalid("expected HH:MM"));
        }

        // Both parts are 1-2 ASCII digits, so these cannot overflow u8.
        let hour: u8 = h.parse().map_err(|_| invalid("hour is not a number"))?;
        let minute: u8 = m.parse().map_err(|_| invalid("minute is not a number"))?;

        if hour > 23 {
            return Err(invalid("hour must be within 0..=23"));
        }
        if minute > 59 {
            return Err(invalid("minute must be within 0..=59"));
        }
        Ok(Self { hour, minute })
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}
