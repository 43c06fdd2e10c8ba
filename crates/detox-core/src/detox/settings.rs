use serde::{Deserialize, Serialize};

use crate::window::{DetoxWindow, TimeOfDay};

/// User-configured daily detox window.
///
/// Times are kept as the `"HH:MM"` strings the user entered so a malformed
/// record loaded from storage round-trips untouched; [`window`](Self::window)
/// is the validated view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetoxSettings {
    pub enabled: bool,
    pub start_time: String,
    pub end_time: String,
    /// ISO weekdays, Monday = 1 ... Sunday = 7.
    pub active_days: Vec<u8>,
}

impl Default for DetoxSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            start_time: "06:00".to_string(),
            end_time: "09:00".to_string(),
            active_days: ALL_DAYS.to_vec(),
        }
    }
}

pub const ALL_DAYS: [u8; 7] = [1, 2, 3, 4, 5, 6, 7];

impl DetoxSettings {
    /// Parsed window, or `None` if either time is malformed.
    pub fn window(&self) -> Option<DetoxWindow> {
        let start = self.start_time.parse::<TimeOfDay>().ok()?;
        let end = self.end_time.parse::<TimeOfDay>().ok()?;
        Some(DetoxWindow::new(start, end))
    }

    /// Copy with `day` removed if present, appended otherwise.
    pub fn with_day_toggled(&self, day: u8) -> Self {
        let mut next = self.clone();
        if next.active_days.contains(&day) {
            next.active_days.retain(|d| *d != day);
        } else {
            next.active_days.push(day);
        }
        next
    }

    /// Days outside `1..=7`. They are kept but never match a date.
    pub fn out_of_range_days(&self) -> Vec<u8> {
        self.active_days
            .iter()
            .copied()
            .filter(|d| !(1..=7).contains(d))
            .collect()
    }
}

/// Shallow partial update. `None` fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_days: Option<Vec<u8>>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.active_days.is_none()
    }

    /// Merge over `base`.
    pub fn apply(&self, base: &DetoxSettings) -> DetoxSettings {
        DetoxSettings {
            enabled: self.enabled.unwrap_or(base.enabled),
            start_time: self.start_time.clone().unwrap_or_else(|| base.start_time.clone()),
            end_time: self.end_time.clone().unwrap_or_else(|| base.end_time.clone()),
            active_days: self
                .active_days
                .clone()
                .unwrap_or_else(|| base.active_days.clone()),
        }
    }
}

impl From<DetoxSettings> for SettingsPatch {
    fn from(s: DetoxSettings) -> Self {
        Self {
            enabled: Some(s.enabled),
            start_time: Some(s.start_time),
            end_time: Some(s.end_time),
            active_days: Some(s.active_days),
        }
    }
}
