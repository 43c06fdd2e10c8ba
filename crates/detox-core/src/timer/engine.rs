//! Focus timer implementation.
//!
//! The focus timer is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           +-- remaining hits 0 --> flip Focus/Break, keep Running
//! ```
//!
//! Time past the end of a phase carries into the next one. After a long gap
//! between ticks, every phase that fit in the gap is skipped and a single
//! event reports the phase that was running and the phase now running.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = FocusTimer::from_config(&config.timer);
//! timer.toggle();
//! // In a loop:
//! timer.tick(); // Returns Some(Event) when a phase completes
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::genre::Genre;
use crate::events::Event;
use crate::storage::TimerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Focus,
    Break,
}

impl TimerPhase {
    fn flipped(self) -> Self {
        match self {
            TimerPhase::Focus => TimerPhase::Break,
            TimerPhase::Break => TimerPhase::Focus,
        }
    }
}

/// Alternating focus/break countdown.
///
/// Operates on wall-clock deltas -- no internal thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusTimer {
    focus_ms: u64,
    break_ms: u64,
    genre: Genre,
    phase: TimerPhase,
    state: TimerState,
    /// Remaining time in milliseconds for the current phase.
    remaining_ms: u64,
    /// Instant of the last start/resume/tick while running.
    #[serde(default)]
    last_tick: Option<DateTime<Utc>>,
}

impl FocusTimer {
    /// Create an idle timer at the start of a focus phase.
    pub fn new(focus_minutes: u32, break_minutes: u32) -> Self {
        let focus_ms = minutes_to_ms(focus_minutes);
        Self {
            focus_ms,
            break_ms: minutes_to_ms(break_minutes),
            genre: Genre::default(),
            phase: TimerPhase::Focus,
            state: TimerState::Idle,
            remaining_ms: focus_ms,
            last_tick: None,
        }
    }

    pub fn from_config(config: &TimerConfig) -> Self {
        let mut timer = Self::new(config.focus_minutes, config.break_minutes);
        timer.genre = config.default_genre;
        timer
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    /// Remaining whole seconds, rounded up so `00:00` only shows at zero.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }

    /// `MM:SS` rendering of the remaining time.
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_genre(&mut self, genre: Genre) {
        self.genre = genre;
    }

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(Utc::now())
    }

    pub fn start_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state == TimerState::Running {
            return None;
        }
        self.state = TimerState::Running;
        self.last_tick = Some(now);
        Some(Event::TimerStarted {
            phase: self.phase,
            genre: self.genre,
            remaining_secs: self.remaining_secs(),
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(Utc::now())
    }

    pub fn pause_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now);
        self.state = TimerState::Paused;
        self.last_tick = None;
        Some(Event::TimerPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs(),
            at: now,
        })
    }

    /// Single start/pause button.
    pub fn toggle(&mut self) -> Option<Event> {
        self.toggle_at(Utc::now())
    }

    pub fn toggle_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.state {
            TimerState::Running => self.pause_at(now),
            TimerState::Idle | TimerState::Paused => self.start_at(now),
        }
    }

    /// Back to an idle focus phase with the full duration.
    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState::Idle;
        self.phase = TimerPhase::Focus;
        self.remaining_ms = self.focus_ms;
        self.last_tick = None;
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Call periodically. Returns `Some(Event::TimerPhaseCompleted)` when a
    /// phase finishes; the timer keeps running into the next phase.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(Utc::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let elapsed = self.take_elapsed(now);
        if elapsed < self.remaining_ms {
            self.remaining_ms -= elapsed;
            return None;
        }

        let completed = self.phase;
        let mut overflow = elapsed - self.remaining_ms;
        self.phase = completed.flipped();
        let cycle_ms = self.focus_ms.saturating_add(self.break_ms);
        if cycle_ms > 0 {
            overflow %= cycle_ms;
            while overflow >= self.phase_duration_ms(self.phase) {
                overflow -= self.phase_duration_ms(self.phase);
                self.phase = self.phase.flipped();
            }
        }
        self.remaining_ms = self.phase_duration_ms(self.phase).saturating_sub(overflow);
        tracing::debug!(?completed, next = ?self.phase, remaining_ms = self.remaining_ms, "timer phase completed");
        Some(Event::TimerPhaseCompleted {
            completed,
            next: self.phase,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn phase_duration_ms(&self, phase: TimerPhase) -> u64 {
        match phase {
            TimerPhase::Focus => self.focus_ms,
            TimerPhase::Break => self.break_ms,
        }
    }

    /// Milliseconds since the last tick, moving the tick mark to `now`.
    fn take_elapsed(&mut self, now: DateTime<Utc>) -> u64 {
        let Some(last) = self.last_tick.replace(now) else {
            return 0;
        };
        (now - last).num_milliseconds().max(0) as u64
    }

    fn flush_elapsed(&mut self, now: DateTime<Utc>) {
        let elapsed = self.take_elapsed(now);
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
    }
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::from_config(&TimerConfig::default())
    }
}

fn minutes_to_ms(minutes: u32) -> u64 {
    (minutes as u64).saturating_mul(60).saturating_mul(1000)
}

/// Render seconds as zero-padded `MM:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
