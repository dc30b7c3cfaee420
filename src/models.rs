//! Data models for the focus timer.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// The kind of session the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    /// Work interval.
    #[default]
    Focus,
    /// Rest interval between focus sessions.
    ShortBreak,
    /// Longer rest, every `long_break_interval`-th focus session.
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [Self::Focus, Self::ShortBreak, Self::LongBreak];

    /// Returns true for either break mode.
    pub fn is_break(&self) -> bool {
        !matches!(self, Self::Focus)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Focus => "🍅",
            Self::ShortBreak => "☕",
            Self::LongBreak => "🌴",
        }
    }

    /// Stable identifier used for storage and menu ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "shortBreak",
            Self::LongBreak => "longBreak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "focus" => Some(Self::Focus),
            "shortBreak" => Some(Self::ShortBreak),
            "longBreak" => Some(Self::LongBreak),
            _ => None,
        }
    }
}

/// Mutable snapshot of the current session.
///
/// Persisted after every mutation and restored on start-up with
/// `is_running` forced to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub mode: TimerMode,
    pub seconds_left: u32,
    pub total_seconds: u32,
    pub is_running: bool,
    pub completed_focus_count: u32,
}

impl TimerState {
    /// A fresh, stopped session of `mode` lasting `total_seconds`.
    pub fn new(mode: TimerMode, total_seconds: u32) -> Self {
        Self {
            mode,
            seconds_left: total_seconds,
            total_seconds,
            is_running: false,
            completed_focus_count: 0,
        }
    }

    /// Returns the progress (0.0 to 1.0) through the current session.
    pub fn progress(&self) -> f32 {
        if self.total_seconds == 0 {
            return 1.0;
        }
        1.0 - (self.seconds_left as f32 / self.total_seconds as f32)
    }

    /// True when the session is armed but has not counted down at all.
    pub fn is_fresh(&self) -> bool {
        !self.is_running && self.seconds_left == self.total_seconds
    }
}

/// A naturally completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub mode: TimerMode,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: u32,
}

impl HistoryEntry {
    /// Local wall-clock time of completion, formatted as `HH:MM`.
    pub fn local_time(&self) -> String {
        self.completed_at
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

/// Aggregated history for the current local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailySummary {
    pub focus_sessions: u32,
    pub total_minutes: u32,
}

impl DailySummary {
    /// Summarises the entries completed on the local date of `now`.
    pub fn from_entries(entries: &[HistoryEntry], now: DateTime<Local>) -> Self {
        let today = now.date_naive();
        let todays = entries
            .iter()
            .filter(|e| e.completed_at.with_timezone(&Local).date_naive() == today);

        let mut focus_sessions = 0;
        let mut total_seconds: u64 = 0;
        for entry in todays {
            if entry.mode == TimerMode::Focus {
                focus_sessions += 1;
            }
            total_seconds += u64::from(entry.duration_seconds);
        }

        Self {
            focus_sessions,
            total_minutes: ((total_seconds + 30) / 60) as u32,
        }
    }
}
