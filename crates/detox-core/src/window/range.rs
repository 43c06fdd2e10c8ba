//! Window containment and remaining-time arithmetic.
//!
//! A window `[start, end]` is inclusive on both ends. When `start > end`
//! the window crosses midnight (e.g. 22:00 - 06:00) and contains every
//! time at or after `start` plus every time at or before `end`.
//!
//! The `&str` functions are the lenient surface used with persisted
//! settings: malformed input is logged and answered with `false` / `0`.
//! [`DetoxWindow`] is the typed equivalent for already-validated times.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::time_of_day::{TimeOfDay, MINUTES_PER_DAY};

/// Minute-of-day containment, inclusive on both ends.
fn contains_minutes(time: u32, start: u32, end: u32) -> bool {
    if start <= end {
        time >= start && time <= end
    } else {
        time >= start || time <= end
    }
}

/// Minutes from `current` until the next occurrence of `end`.
fn remaining_between(current: u32, end: u32) -> u32 {
    if end >= current {
        end - current
    } else {
        end + MINUTES_PER_DAY - current
    }
}

fn parse_logged(t: &str, context: &str) -> Option<TimeOfDay> {
    match t.parse::<TimeOfDay>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(input = t, error = %e, "{context}: malformed time");
            None
        }
    }
}

/// Parse `"HH:MM"` into minutes since midnight. `None` on malformed input.
pub fn to_minutes(t: &str) -> Option<u32> {
    t.parse::<TimeOfDay>().ok().map(TimeOfDay::minutes)
}

/// Whether `time` falls inside `[start, end]`, honoring windows that cross
/// midnight. Malformed input yields `false`.
pub fn is_time_in_range(time: &str, start: &str, end: &str) -> bool {
    let (Some(t), Some(s), Some(e)) = (
        parse_logged(time, "is_time_in_range"),
        parse_logged(start, "is_time_in_range"),
        parse_logged(end, "is_time_in_range"),
    ) else {
        return false;
    };
    contains_minutes(t.minutes(), s.minutes(), e.minutes())
}

/// Minutes from `current` until `end`, treating an earlier `end` as the
/// next day. Always `< 1440`. Malformed input yields `0`.
///
/// This does not check that `current` is inside the window; gate on
/// [`is_time_in_range`] first.
pub fn remaining_minutes(current: &str, end: &str) -> u32 {
    let (Some(c), Some(e)) = (
        parse_logged(current, "remaining_minutes"),
        parse_logged(end, "remaining_minutes"),
    ) else {
        return 0;
    };
    remaining_between(c.minutes(), e.minutes())
}

/// Render a minute count as `"Xh Ym"`, or `"Ym"` under an hour.
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Render `"HH:MM"` in 12-hour form. Malformed input is returned unchanged.
pub fn format_time_12h(t: &str) -> String {
    parse_logged(t, "format_time_12h")
        .map(TimeOfDay::to_12h)
        .unwrap_or_else(|| t.to_string())
}

/// ISO weekday number: Monday = 1 ... Sunday = 7.
pub fn iso_weekday(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

/// Whether `date` falls on one of `active_days` (Monday = 1 ... Sunday = 7).
pub fn is_active_day(active_days: &[u8], date: NaiveDate) -> bool {
    active_days.contains(&iso_weekday(date))
}

/// A validated daily detox window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetoxWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl DetoxWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// True when the window crosses midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.start.minutes() > self.end.minutes()
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        contains_minutes(time.minutes(), self.start.minutes(), self.end.minutes())
    }

    /// Minutes from `now` until the window closes. Meaningful only while
    /// [`contains`](Self::contains) holds.
    pub fn remaining_from(&self, now: TimeOfDay) -> u32 {
        remaining_between(now.minutes(), self.end.minutes())
    }

    /// Length of the window in minutes.
    pub fn total_minutes(&self) -> u32 {
        remaining_between(self.start.minutes(), self.end.minutes())
    }

    /// Date on which the occurrence containing `now` opened. For a window
    /// that crosses midnight, times before the start belong to the
    /// occurrence that opened the previous day.
    pub fn opened_on(&self, now: NaiveDateTime) -> NaiveDate {
        let date = now.date();
        let time = TimeOfDay::from_minutes(now.hour() * 60 + now.minute());
        if self.wraps_midnight() && time.minutes() < self.start.minutes() {
            date.pred_opt().unwrap_or(date)
        } else {
            date
        }
    }

    /// Date on which the occurrence opened on `opened` closes.
    pub fn closes_on(&self, opened: NaiveDate) -> NaiveDate {
        if self.wraps_midnight() {
            opened.succ_opt().unwrap_or(opened)
        } else {
            opened
        }
    }

    /// Fraction of the window already elapsed at `now`, clamped to `0.0..=1.0`.
    /// A zero-length window reports `1.0`.
    pub fn progress_at(&self, now: TimeOfDay) -> f64 {
        let total = self.total_minutes();
        if total == 0 {
            return 1.0;
        }
        let remaining = self.remaining_from(now).min(total);
        let elapsed = total - remaining;
        (elapsed as f64 / total as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn non_wrapping_window_is_inclusive() {
        assert!(is_time_in_range("06:00", "06:00", "09:00"));
        assert!(is_time_in_range("09:00", "06:00", "09:00"));
        assert!(is_time_in_range("07:30", "06:00", "09:00"));
        assert!(!is_time_in_range("05:59", "06:00", "09:00"));
        assert!(!is_time_in_range("09:01", "06:00", "09:00"));
    }

    #[test]
    fn overnight_window_scenario() {
        assert!(is_time_in_range("23:30", "22:00", "06:00"));
        assert!(is_time_in_range("00:00", "22:00", "06:00"));
        assert!(is_time_in_range("06:00", "22:00", "06:00"));
        assert!(!is_time_in_range("12:00", "22:00", "06:00"));
        assert!(!is_time_in_range("21:59", "22:00", "06:00"));
        assert_eq!(remaining_minutes("23:30", "06:00"), 390);
    }

    #[test]
    fn malformed_input_falls_back() {
        assert!(!is_time_in_range("7:xx", "06:00", "09:00"));
        assert!(!is_time_in_range("07:00", "25:00", "09:00"));
        assert_eq!(remaining_minutes("bad", "09:00"), 0);
        assert_eq!(remaining_minutes("07:00", "09:61"), 0);
        assert_eq!(to_minutes("12:60"), None);
        assert_eq!(to_minutes("01:01"), Some(61));
    }

    #[test]
    fn remaining_same_day_and_next_day() {
        assert_eq!(remaining_minutes("07:00", "09:00"), 120);
        assert_eq!(remaining_minutes("09:00", "09:00"), 0);
        assert_eq!(remaining_minutes("09:01", "09:00"), 1439);
    }

    #[test]
    fn format_duration_examples() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(60), "1h 0m");
        assert_eq!(format_duration(90), "1h 30m");
        assert_eq!(format_duration(390), "6h 30m");
    }

    #[test]
    fn format_time_12h_falls_back_to_input() {
        assert_eq!(format_time_12h("06:00"), "6:00 AM");
        assert_eq!(format_time_12h("18:45"), "6:45 PM");
        assert_eq!(format_time_12h("nope"), "nope");
    }

    #[test]
    fn weekday_numbering_remaps_sunday() {
        // 2026-10-18 is a Sunday, 2026-10-19 a Monday.
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(iso_weekday(sunday), 7);
        assert_eq!(iso_weekday(monday), 1);
        assert!(is_active_day(&[6, 7], sunday));
        assert!(!is_active_day(&[1, 2, 3, 4, 5], sunday));
        assert!(is_active_day(&[1, 1, 3], monday));
    }

    #[test]
    fn window_progress() {
        let w = DetoxWindow::new(t("06:00"), t("09:00"));
        assert_eq!(w.total_minutes(), 180);
        assert_eq!(w.progress_at(t("06:00")), 0.0);
        assert_eq!(w.progress_at(t("07:30")), 0.5);
        assert_eq!(w.progress_at(t("09:00")), 1.0);

        let overnight = DetoxWindow::new(t("22:00"), t("06:00"));
        assert!(overnight.wraps_midnight());
        assert_eq!(overnight.total_minutes(), 480);
        assert_eq!(overnight.progress_at(t("02:00")), 0.5);
    }

    #[test]
    fn zero_length_window_reports_full_progress() {
        let w = DetoxWindow::new(t("06:00"), t("06:00"));
        assert_eq!(w.total_minutes(), 0);
        assert!(w.contains(t("06:00")));
        assert!(!w.contains(t("06:01")));
        assert_eq!(w.progress_at(t("06:00")), 1.0);
    }

    fn hhmm(m: u32) -> String {
        TimeOfDay::from_minutes(m).to_string()
    }

    #[test]
    fn occurrence_dates_follow_the_window_start() {
        let at = |s: &str| s.parse::<NaiveDateTime>().unwrap();
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();

        let morning = DetoxWindow::new(t("06:00"), t("09:00"));
        assert_eq!(morning.opened_on(at("2026-03-10T07:00:00")), d("2026-03-10"));
        assert_eq!(morning.closes_on(d("2026-03-10")), d("2026-03-10"));

        let overnight = DetoxWindow::new(t("22:00"), t("06:00"));
        assert_eq!(overnight.opened_on(at("2026-03-10T23:30:00")), d("2026-03-10"));
        assert_eq!(overnight.opened_on(at("2026-03-11T02:00:00")), d("2026-03-10"));
        assert_eq!(overnight.closes_on(d("2026-03-10")), d("2026-03-11"));
    }

    proptest! {
        #[test]
        fn prop_non_wrapping_matches_plain_comparison(a in 0u32..1440, b in 0u32..1440, x in 0u32..1440) {
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            prop_assert_eq!(
                is_time_in_range(&hhmm(x), &hhmm(start), &hhmm(end)),
                start <= x && x <= end
            );
        }

        #[test]
        fn prop_wrapping_matches_either_side(a in 0u32..1440, b in 0u32..1440, x in 0u32..1440) {
            prop_assume!(a != b);
            let (start, end) = if a > b { (a, b) } else { (b, a) };
            prop_assert_eq!(
                is_time_in_range(&hhmm(x), &hhmm(start), &hhmm(end)),
                x >= start || x <= end
            );
        }

        #[test]
        fn prop_remaining_is_bounded(c in 0u32..1440, e in 0u32..1440) {
            let r = remaining_minutes(&hhmm(c), &hhmm(e));
            prop_assert!(r < 1440);
            prop_assert_eq!((c + r) % 1440, e);
        }

        #[test]
        fn prop_progress_is_a_fraction(a in 0u32..1440, b in 0u32..1440, x in 0u32..1440) {
            let w = DetoxWindow::new(TimeOfDay::from_minutes(a), TimeOfDay::from_minutes(b));
            let p = w.progress_at(TimeOfDay::from_minutes(x));
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
