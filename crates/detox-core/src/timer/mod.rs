mod engine;
mod genre;

pub use engine::{format_clock, FocusTimer, TimerPhase, TimerState};
pub use genre::Genre;
