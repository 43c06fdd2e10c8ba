//! Streak accounting engine.
//!
//! Owns the in-memory `DetoxSettings` and `DetoxStats`, loaded once from the
//! key-value store. Every mutation is a full read-modify-write of one record.
//! The ordering between the in-memory commit and the durable write follows
//! [`WritePolicy`].
//!
//! Callers that share an engine must serialize logically dependent
//! mutations themselves (e.g. behind a `tokio::sync::Mutex`); the last
//! completed write wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::settings::{DetoxSettings, SettingsPatch};
use super::stats::{CompletionOutcome, DetoxStats};
use crate::error::{CoreError, StoreError, ValidationError};
use crate::events::Event;
use crate::storage::kv::{load_record, save_record};
use crate::storage::{keys, Config, KeyValueStore, WritePolicy};
use crate::window::{
    current_time, is_active_day, is_time_in_range, remaining_minutes, today, Clock, TimeOfDay,
};

/// Where a settings-governed day currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    /// Outside the window, on an inactive day, or detox disabled.
    Inactive,
    /// Inside the window on an active day.
    Locked,
}

pub struct DetoxEngine {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    settings: DetoxSettings,
    stats: DetoxStats,
    write_policy: WritePolicy,
    events: Vec<Event>,
}

impl std::fmt::Debug for DetoxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetoxEngine")
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .field("write_policy", &self.write_policy)
            .finish_non_exhaustive()
    }
}

impl DetoxEngine {
    /// Load both records. Absent or malformed records fall back to defaults;
    /// store read failures propagate.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Result<Self, CoreError> {
        let settings = load_record::<DetoxSettings>(store.as_ref(), keys::DETOX_SETTINGS)
            .await?
            .unwrap_or_default();
        let stats = load_record::<DetoxStats>(store.as_ref(), keys::DETOX_STATS)
            .await?
            .unwrap_or_default();

        tracing::debug!(
            current_streak = stats.current_streak,
            start = %settings.start_time,
            end = %settings.end_time,
            "detox state loaded"
        );

        Ok(Self {
            store,
            clock,
            settings,
            stats,
            write_policy: config.persistence.write_policy,
            events: Vec::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &DetoxSettings {
        &self.settings
    }

    pub fn stats(&self) -> &DetoxStats {
        &self.stats
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Local calendar date according to the engine's clock.
    pub fn today(&self) -> NaiveDate {
        today(self.clock.as_ref())
    }

    pub fn now_time(&self) -> TimeOfDay {
        current_time(self.clock.as_ref())
    }

    /// Whether today is one of the configured active days.
    pub fn is_detox_day(&self) -> bool {
        is_active_day(&self.settings.active_days, self.today())
    }

    /// Enabled, active day, and the clock inside the window.
    pub fn is_detox_active(&self) -> bool {
        self.settings.enabled
            && self.is_detox_day()
            && is_time_in_range(
                &self.now_time().to_string(),
                &self.settings.start_time,
                &self.settings.end_time,
            )
    }

    pub fn phase(&self) -> DayPhase {
        if self.is_detox_active() {
            DayPhase::Locked
        } else {
            DayPhase::Inactive
        }
    }

    /// Minutes until the window closes, or 0 when not locked.
    pub fn remaining_minutes(&self) -> u32 {
        if !self.is_detox_active() {
            return 0;
        }
        remaining_minutes(&self.now_time().to_string(), &self.settings.end_time)
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    // ── Stats transitions ────────────────────────────────────────────

    /// Count today as a completed detox day.
    pub async fn complete_detox_day(&mut self) -> Result<CompletionOutcome, CoreError> {
        let date = self.today();
        self.complete_detox_day_on(date).await
    }

    /// Count `date` as a completed detox day. A second call for the same
    /// date is a no-op.
    pub async fn complete_detox_day_on(
        &mut self,
        date: NaiveDate,
    ) -> Result<CompletionOutcome, CoreError> {
        let (next, outcome) = self.stats.after_completion(date);
        if outcome == CompletionOutcome::AlreadyCompleted {
            tracing::debug!(%date, "detox day already completed");
            return Ok(outcome);
        }

        self.commit_stats(next).await?;
        tracing::info!(
            %date,
            ?outcome,
            current_streak = self.stats.current_streak,
            "detox day completed"
        );
        self.events.push(Event::DetoxDayCompleted {
            date,
            outcome,
            current_streak: self.stats.current_streak,
            longest_streak: self.stats.longest_streak,
            total_detox_days: self.stats.total_detox_days,
        });
        Ok(outcome)
    }

    /// Zero the current streak. Returns the streak it replaced.
    pub async fn reset_streak(&mut self) -> Result<u32, CoreError> {
        let previous_streak = self.stats.current_streak;
        self.commit_stats(self.stats.with_streak_reset()).await?;
        tracing::info!(previous_streak, "streak reset");
        self.events.push(Event::StreakReset { previous_streak });
        Ok(previous_streak)
    }

    /// Restore all counters to their defaults.
    pub async fn reset_stats(&mut self) -> Result<(), CoreError> {
        self.commit_stats(DetoxStats::default()).await?;
        tracing::info!("stats reset");
        self.events.push(Event::StatsReset);
        Ok(())
    }

    // ── Settings transitions ─────────────────────────────────────────

    /// Merge `patch` over the current settings and persist the result.
    ///
    /// Malformed start/end times are rejected before anything is written.
    /// Day numbers are not validated.
    pub async fn update_settings(
        &mut self,
        patch: SettingsPatch,
    ) -> Result<&DetoxSettings, CoreError> {
        if let Some(t) = &patch.start_time {
            validate_time("startTime", t)?;
        }
        if let Some(t) = &patch.end_time {
            validate_time("endTime", t)?;
        }

        let next = patch.apply(&self.settings);
        let odd_days = next.out_of_range_days();
        if !odd_days.is_empty() {
            tracing::warn!(days = ?odd_days, "storing active days outside 1..=7");
        }

        self.commit_settings(next).await?;
        self.events.push(Event::SettingsUpdated {
            settings: self.settings.clone(),
        });
        Ok(&self.settings)
    }

    pub async fn toggle_active_day(&mut self, day: u8) -> Result<&DetoxSettings, CoreError> {
        let active_days = self.settings.with_day_toggled(day).active_days;
        self.update_settings(SettingsPatch {
            active_days: Some(active_days),
            ..SettingsPatch::default()
        })
        .await
    }

    pub async fn toggle_enabled(&mut self) -> Result<&DetoxSettings, CoreError> {
        let enabled = !self.settings.enabled;
        self.update_settings(SettingsPatch {
            enabled: Some(enabled),
            ..SettingsPatch::default()
        })
        .await
    }

    pub async fn set_start_time(&mut self, t: &str) -> Result<&DetoxSettings, CoreError> {
        self.update_settings(SettingsPatch {
            start_time: Some(t.to_string()),
            ..SettingsPatch::default()
        })
        .await
    }

    pub async fn set_end_time(&mut self, t: &str) -> Result<&DetoxSettings, CoreError> {
        self.update_settings(SettingsPatch {
            end_time: Some(t.to_string()),
            ..SettingsPatch::default()
        })
        .await
    }

    pub async fn reset_settings(&mut self) -> Result<&DetoxSettings, CoreError> {
        self.update_settings(DetoxSettings::default().into()).await
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn commit_stats(&mut self, next: DetoxStats) -> Result<(), CoreError> {
        match self.write_policy {
            WritePolicy::CommitAfterWrite => {
                self.write(keys::DETOX_STATS, &next, false).await?;
                self.stats = next;
            }
            WritePolicy::Optimistic => {
                self.stats = next.clone();
                self.write(keys::DETOX_STATS, &next, true).await?;
            }
        }
        Ok(())
    }

    async fn commit_settings(&mut self, next: DetoxSettings) -> Result<(), CoreError> {
        match self.write_policy {
            WritePolicy::CommitAfterWrite => {
                self.write(keys::DETOX_SETTINGS, &next, false).await?;
                self.settings = next;
            }
            WritePolicy::Optimistic => {
                self.settings = next.clone();
                self.write(keys::DETOX_SETTINGS, &next, true).await?;
            }
        }
        Ok(())
    }

    async fn write<T: Serialize + Sync>(
        &mut self,
        key: &str,
        record: &T,
        committed: bool,
    ) -> Result<(), StoreError> {
        if let Err(e) = save_record(self.store.as_ref(), key, record).await {
            tracing::error!(key, error = %e, committed, "failed to persist record");
            self.events.push(Event::PersistFailed {
                key: key.to_string(),
                message: e.to_string(),
                committed,
            });
            return Err(e);
        }
        Ok(())
    }
}

fn validate_time(field: &str, value: &str) -> Result<TimeOfDay, ValidationError> {
    value.parse::<TimeOfDay>().map_err(|e| match e {
        ValidationError::InvalidTime { reason, .. } => ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("'{value}': {reason}"),
        },
        other => other,
    })
}
