//! Append-only log of closed lock sessions.
//!
//! Kept apart from the streak counters: the engine never reads it. It backs
//! the weekly completion view.
//!
//! Stored elements that no longer parse are skipped on read but written back
//! untouched on append. A stored value that is not an array at all makes the
//! log read-only until it is repaired.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{CoreError, StoreError};
use crate::storage::{keys, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetoxDayHistory {
    pub date: NaiveDate,
    pub completed: bool,
    pub start_time: String,
    pub end_time: String,
    pub bypass_count: u32,
    /// Minutes spent locked before the session closed.
    #[serde(default)]
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// ISO weekday, Monday = 1.
    pub weekday: u8,
    pub completed: bool,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub days: Vec<DaySummary>,
    pub completed_days: u32,
    /// `completed_days / 7`
    pub completion_rate: f64,
    pub total_minutes: u32,
}

pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<DetoxDayHistory>,
    /// Stored array as read, including elements that did not parse.
    raw: Vec<Value>,
    readable: bool,
}

impl HistoryLog {
    /// Read the log. An absent key starts an empty log.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, CoreError> {
        let (raw, readable) = match store.get(keys::DETOX_HISTORY).await? {
            None => (Vec::new(), true),
            Some(Value::Array(items)) => (items, true),
            Some(other) => {
                tracing::warn!(
                    key = keys::DETOX_HISTORY,
                    value = %other,
                    "stored history is not an array, appends disabled"
                );
                (Vec::new(), false)
            }
        };

        let mut entries = Vec::with_capacity(raw.len());
        for (index, item) in raw.iter().enumerate() {
            match serde_json::from_value::<DetoxDayHistory>(item.clone()) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unreadable history entry");
                }
            }
        }
        Ok(Self {
            store,
            entries,
            raw,
            readable,
        })
    }

    pub fn entries(&self) -> &[DetoxDayHistory] {
        &self.entries
    }

    /// False when the stored value could not be read as a list.
    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Append one entry and persist the whole array.
    ///
    /// Refuses to write over a stored value that is not an array.
    pub async fn append(&mut self, entry: DetoxDayHistory) -> Result<(), CoreError> {
        if !self.readable {
            return Err(StoreError::WriteFailed {
                key: keys::DETOX_HISTORY.to_string(),
                message: "stored history is unreadable, not overwriting".to_string(),
            }
            .into());
        }
        let mut next = self.raw.clone();
        next.push(serde_json::to_value(&entry)?);
        self.store
            .set(keys::DETOX_HISTORY, Value::Array(next.clone()))
            .await?;
        self.raw = next;
        self.entries.push(entry);
        Ok(())
    }

    /// Monday-to-Sunday week containing `today`.
    ///
    /// A day counts as completed if any entry for it is completed; minutes
    /// add up across entries.
    pub fn weekly_summary(&self, today: NaiveDate) -> WeeklySummary {
        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);

        let days: Vec<DaySummary> = (0..7u8)
            .map(|offset| {
                let date = week_start + Duration::days(offset as i64);
                let mut completed = false;
                let mut minutes = 0u32;
                for entry in self.entries.iter().filter(|e| e.date == date) {
                    completed |= entry.completed;
                    minutes = minutes.saturating_add(entry.minutes);
                }
                DaySummary {
                    date,
                    weekday: offset + 1,
                    completed,
                    minutes,
                }
            })
            .collect();

        let completed_days = days.iter().filter(|d| d.completed).count() as u32;
        let total_minutes = days.iter().map(|d| d.minutes).sum();
        WeeklySummary {
            week_start,
            days,
            completed_days,
            completion_rate: completed_days as f64 / 7.0,
            total_minutes,
        }
    }
}
