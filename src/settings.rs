//! User-configurable timer settings and their validation rules.

use crate::models::TimerMode;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const FOCUS_MINUTES: RangeInclusive<i64> = 1..=60;
pub const SHORT_BREAK_MINUTES: RangeInclusive<i64> = 1..=30;
pub const LONG_BREAK_MINUTES: RangeInclusive<i64> = 1..=60;
pub const LONG_BREAK_INTERVAL: RangeInclusive<i64> = 1..=10;

/// Durations and auto-advance flags.
///
/// Values held here are always within range; raw input goes through
/// [`SettingsUpdate`] and is clamped before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    /// Duration of a focus session in minutes.
    pub focus_minutes: u32,
    /// Duration of a short break in minutes.
    pub short_break_minutes: u32,
    /// Duration of a long break in minutes.
    pub long_break_minutes: u32,
    /// Every Nth completed focus session is followed by a long break.
    pub long_break_interval: u32,
    /// Start the break automatically once a focus session completes.
    pub auto_start_breaks: bool,
    /// Start the next focus session automatically once a break completes.
    pub auto_start_pomodoros: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_interval: 4,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

impl TimerSettings {
    /// Configured duration of `mode` in seconds.
    pub fn duration_secs(&self, mode: TimerMode) -> u32 {
        let minutes = match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::ShortBreak => self.short_break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        };
        minutes * 60
    }

    /// Whether finishing a session of `mode` should start the next one.
    pub fn auto_starts_after(&self, mode: TimerMode) -> bool {
        match mode {
            TimerMode::Focus => self.auto_start_breaks,
            TimerMode::ShortBreak | TimerMode::LongBreak => self.auto_start_pomodoros,
        }
    }

    /// Merges a partial update, clamping every supplied field.
    pub fn apply(&mut self, update: &SettingsUpdate) {
        let defaults = Self::default();
        if let Some(v) = update.focus_minutes {
            self.focus_minutes = clamp_or_default(v, FOCUS_MINUTES, defaults.focus_minutes);
        }
        if let Some(v) = update.short_break_minutes {
            self.short_break_minutes =
                clamp_or_default(v, SHORT_BREAK_MINUTES, defaults.short_break_minutes);
        }
        if let Some(v) = update.long_break_minutes {
            self.long_break_minutes =
                clamp_or_default(v, LONG_BREAK_MINUTES, defaults.long_break_minutes);
        }
        if let Some(v) = update.long_break_interval {
            self.long_break_interval =
                clamp_or_default(v, LONG_BREAK_INTERVAL, defaults.long_break_interval);
        }
        if let Some(v) = update.auto_start_breaks {
            self.auto_start_breaks = v;
        }
        if let Some(v) = update.auto_start_pomodoros {
            self.auto_start_pomodoros = v;
        }
    }

    /// Returns a copy with every field forced into range.
    ///
    /// Used on values read back from storage, which may have been edited by hand.
    pub fn sanitized(&self) -> Self {
        let mut clean = Self::default();
        clean.apply(&SettingsUpdate::from(self));
        clean
    }
}

/// Non-positive input falls back to the default, oversized input to the maximum.
fn clamp_or_default(value: i64, range: RangeInclusive<i64>, default: u32) -> u32 {
    if value < *range.start() {
        default
    } else {
        value.min(*range.end()) as u32
    }
}

/// A partial settings change; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub focus_minutes: Option<i64>,
    pub short_break_minutes: Option<i64>,
    pub long_break_minutes: Option<i64>,
    pub long_break_interval: Option<i64>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_pomodoros: Option<bool>,
}

impl SettingsUpdate {
    /// Update touching only the duration of `mode`.
    pub fn duration(mode: TimerMode, minutes: i64) -> Self {
        match mode {
            TimerMode::Focus => Self {
                focus_minutes: Some(minutes),
                ..Self::default()
            },
            TimerMode::ShortBreak => Self {
                short_break_minutes: Some(minutes),
                ..Self::default()
            },
            TimerMode::LongBreak => Self {
                long_break_minutes: Some(minutes),
                ..Self::default()
            },
        }
    }
}

impl From<&TimerSettings> for SettingsUpdate {
    fn from(s: &TimerSettings) -> Self {
        Self {
            focus_minutes: Some(i64::from(s.focus_minutes)),
            short_break_minutes: Some(i64::from(s.short_break_minutes)),
            long_break_minutes: Some(i64::from(s.long_break_minutes)),
            long_break_interval: Some(i64::from(s.long_break_interval)),
            auto_start_breaks: Some(s.auto_start_breaks),
            auto_start_pomodoros: Some(s.auto_start_pomodoros),
        }
    }
}

/// Preferences for the completion alarm and desktop notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertSettings {
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notifications_enabled: true,
        }
    }
}
