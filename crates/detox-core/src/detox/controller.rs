//! Tick-driven lock state machine.
//!
//! ```text
//! INACTIVE --(active day && in window)--> LOCKED
//! LOCKED --(window runs out)--> INACTIVE        [credit only with ExpiryPolicy::Complete]
//! LOCKED --(complete)--> INACTIVE + complete_detox_day()
//! LOCKED --(threshold-th bypass)--> INACTIVE + reset_streak()
//! ```
//!
//! A session belongs to one window occurrence, keyed by the date the window
//! opened. A session released by completion or bypass stays parked until
//! that occurrence ends, so the next tick inside the same window does not
//! lock again. A kept session from an earlier occurrence is closed on the
//! next tick, whether or not an inactive tick was ever observed in between.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::engine::{DayPhase, DetoxEngine};
use super::history::{DetoxDayHistory, HistoryLog};
use super::lock::{progress, BypassOutcome, LockExitReason, LockProgress, LockSession};
use super::stats::CompletionOutcome;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::storage::{Config, ExpiryPolicy};

pub struct DetoxController {
    engine: DetoxEngine,
    session: Option<LockSession>,
    threshold: u32,
    expiry: ExpiryPolicy,
    history: Option<HistoryLog>,
}

/// Serializable snapshot of the controller's lock state, for hosts that
/// do not keep the controller alive between actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    pub session: Option<LockSession>,
}

impl DetoxController {
    /// Wrap `engine`. Loads the history log when `persistence.record_history` is on.
    pub async fn new(engine: DetoxEngine, config: &Config) -> Result<Self, CoreError> {
        let history = if config.persistence.record_history {
            Some(HistoryLog::load(engine.store().clone()).await?)
        } else {
            None
        };
        Ok(Self {
            engine,
            session: None,
            threshold: config.lock.bypass_threshold,
            expiry: config.lock.expiry,
            history,
        })
    }

    pub fn engine(&self) -> &DetoxEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DetoxEngine {
        &mut self.engine
    }

    pub fn history(&self) -> Option<&HistoryLog> {
        self.history.as_ref()
    }

    pub fn session(&self) -> Option<&LockSession> {
        self.session.as_ref()
    }

    pub fn lock_state(&self) -> LockState {
        LockState {
            session: self.session.clone(),
        }
    }

    pub fn restore(&mut self, state: LockState) {
        self.session = state.session;
    }

    /// Locked and not yet released.
    pub fn is_locked(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_released())
    }

    /// Countdown for the open lock, if any.
    pub fn progress(&self) -> Option<LockProgress> {
        if !self.is_locked() {
            return None;
        }
        let window = self.engine.settings().window()?;
        Some(progress(&window, self.engine.now_time()))
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.engine.take_events()
    }

    /// Re-evaluate the day phase against the clock.
    pub async fn tick(&mut self) -> Result<DayPhase, CoreError> {
        let phase = self.engine.phase();
        let occurrence = self.current_occurrence(phase);
        if let Some(session) = self.session.take() {
            if occurrence == Some(session.window_date) {
                self.session = Some(session);
            } else if !session.is_released() {
                self.expire(session).await?;
            }
        }
        if let Some(window_date) = occurrence {
            if self.session.is_none() {
                self.open_session(window_date);
            }
        }
        Ok(phase)
    }

    /// The explicit "I made it" action: release the lock and count today.
    ///
    /// Refused while the current window's lock was released by bypass.
    pub async fn complete(&mut self) -> Result<CompletionOutcome, CoreError> {
        self.tick().await?;
        if let Some(mut session) = self.session.take() {
            let released = session.released;
            match released {
                Some(LockExitReason::Bypassed) => {
                    let date = session.window_date;
                    self.session = Some(session);
                    tracing::warn!(%date, "completion refused after bypass release");
                    return Err(ValidationError::WindowBypassed { date }.into());
                }
                Some(_) => {}
                None => {
                    session.release(LockExitReason::Completed);
                    self.close(&session, LockExitReason::Completed, true).await;
                }
            }
            self.session = Some(session);
        }
        self.engine.complete_detox_day().await
    }

    /// One bypass attempt. The threshold-th attempt resets the streak once
    /// and releases the lock.
    pub async fn bypass(&mut self) -> Result<BypassOutcome, CoreError> {
        self.tick().await?;
        let Some(mut session) = self.session.take() else {
            return Ok(BypassOutcome::NotLocked);
        };

        let outcome = session.register_bypass();
        let now = self.engine.clock().now();
        match outcome {
            BypassOutcome::Warned { attempts, remaining } => {
                tracing::info!(attempts, remaining, "bypass attempt");
                self.engine.push_event(Event::BypassAttempted {
                    attempts,
                    remaining,
                    at: now,
                });
                self.session = Some(session);
            }
            BypassOutcome::Released { attempts } => {
                tracing::warn!(attempts, "bypass threshold reached, releasing lock");
                self.close(&session, LockExitReason::Bypassed, false).await;
                self.session = Some(session);
                self.engine.reset_streak().await?;
            }
            BypassOutcome::NotLocked => self.session = Some(session),
        }
        Ok(outcome)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Open date of the window occurrence in progress, or `None` when not locked.
    fn current_occurrence(&self, phase: DayPhase) -> Option<NaiveDate> {
        if phase != DayPhase::Locked {
            return None;
        }
        let window = self.engine.settings().window()?;
        Some(window.opened_on(self.engine.clock().now()))
    }

    fn open_session(&mut self, window_date: NaiveDate) {
        let now = self.engine.clock().now();
        let settings = self.engine.settings();
        let event = Event::LockEntered {
            start_time: settings.start_time.clone(),
            end_time: settings.end_time.clone(),
            remaining_minutes: self.engine.remaining_minutes(),
            at: now,
        };
        tracing::info!(start = %settings.start_time, end = %settings.end_time, "detox window locked");
        self.engine.push_event(event);
        self.session = Some(LockSession::new(now, window_date, self.threshold));
    }

    async fn expire(&mut self, session: LockSession) -> Result<(), CoreError> {
        let credit = self.expiry == ExpiryPolicy::Complete;
        self.close(&session, LockExitReason::Expired, credit).await;
        if !credit {
            return Ok(());
        }
        // Credit the day the occurrence closed, not the day the expiry was noticed.
        let closed_on = self
            .engine
            .settings()
            .window()
            .map_or(session.window_date, |w| w.closes_on(session.window_date));
        if self
            .engine
            .stats()
            .last_completed_date
            .is_some_and(|last| last > closed_on)
        {
            tracing::debug!(%closed_on, "later day already credited, skipping expiry credit");
            return Ok(());
        }
        self.engine.complete_detox_day_on(closed_on).await?;
        Ok(())
    }

    /// Emit the exit event and append the day to history. History write
    /// failures are reported as events, never propagated.
    async fn close(&mut self, session: &LockSession, reason: LockExitReason, completed: bool) {
        let now = self.engine.clock().now();
        tracing::info!(?reason, bypass_attempts = session.bypass_attempts, "detox lock released");
        self.engine.push_event(Event::LockExited {
            reason,
            bypass_attempts: session.bypass_attempts,
            at: now,
        });

        let Some(history) = self.history.as_mut() else {
            return;
        };
        let settings = self.engine.settings();
        let elapsed = (now - session.started_at).num_minutes().max(0);
        // A restored session can be closed long after its window ended.
        // Inclusive end: a full window spans total + 1 minute slots.
        let minutes = match settings.window() {
            Some(w) => elapsed.min(i64::from(w.total_minutes()) + 1),
            None => elapsed,
        };
        let entry = DetoxDayHistory {
            date: session.window_date,
            completed,
            start_time: settings.start_time.clone(),
            end_time: settings.end_time.clone(),
            bypass_count: session.bypass_attempts,
            minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
        };
        if let Err(e) = history.append(entry).await {
            tracing::error!(error = %e, "failed to append detox history");
            self.engine.push_event(Event::PersistFailed {
                key: crate::storage::keys::DETOX_HISTORY.to_string(),
                message: e.to_string(),
                committed: false,
            });
        }
    }
}
