mod clock;
mod range;
mod time_of_day;

pub use clock::{current_time, today, Clock, FixedClock, SystemClock};
pub use range::{
    format_duration, format_time_12h, is_active_day, is_time_in_range, iso_weekday,
    remaining_minutes, to_minutes, DetoxWindow,
};
pub use time_of_day::{TimeOfDay, MINUTES_PER_DAY};
