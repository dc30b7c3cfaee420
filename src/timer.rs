//! Bridges controller events to the UI thread and formats the countdown.

use crate::controller::{CompletionEvent, CompletionSink, TickSink};
use crate::models::{TimerMode, TimerState};
use std::sync::mpsc::Sender;
use tracing::debug;

/// Message sent from the controller's sinks to the tray handler.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerMessage {
    /// The countdown moved to a new whole second.
    Tick { seconds_left: u32 },
    /// A session ran out; trigger alarm, notification and history.
    Completed(CompletionEvent),
}

impl TickSink for Sender<TimerMessage> {
    fn on_tick(&mut self, seconds_left: u32) {
        if self.send(TimerMessage::Tick { seconds_left }).is_err() {
            debug!("Tick receiver dropped");
        }
    }
}

impl CompletionSink for Sender<TimerMessage> {
    fn on_complete(&mut self, event: CompletionEvent) {
        if self.send(TimerMessage::Completed(event)).is_err() {
            debug!("Completion receiver dropped");
        }
    }
}

/// Formats the tray title for the current state.
///
/// `banner` replaces the countdown briefly after a natural completion.
pub fn format_tray_title(state: &TimerState, banner: Option<TimerMode>) -> String {
    if let Some(finished) = banner {
        return completion_banner(finished).to_string();
    }
    let glyph = if state.is_running || state.is_fresh() {
        state.mode.glyph()
    } else {
        "⏸"
    };
    format!("{} {}", glyph, format_time(state.seconds_left))
}

/// Short message shown once a session of `finished` has run out.
pub fn completion_banner(finished: TimerMode) -> &'static str {
    if finished.is_break() {
        "✅ Focus Time!"
    } else {
        "✅ Break Time!"
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_format_tray_title_fresh() {
        let state = TimerState::new(TimerMode::Focus, 1500);
        assert_eq!(format_tray_title(&state, None), "🍅 25:00");
    }

    #[test]
    fn test_format_tray_title_running_break() {
        let mut state = TimerState::new(TimerMode::ShortBreak, 300);
        state.is_running = true;
        state.seconds_left = 272;
        assert_eq!(format_tray_title(&state, None), "☕ 04:32");
    }

    #[test]
    fn test_format_tray_title_paused() {
        let mut state = TimerState::new(TimerMode::Focus, 1500);
        state.seconds_left = 600;
        assert_eq!(format_tray_title(&state, None), "⏸ 10:00");
    }

    #[test]
    fn test_format_tray_title_banner() {
        let state = TimerState::new(TimerMode::ShortBreak, 300);
        assert_eq!(
            format_tray_title(&state, Some(TimerMode::Focus)),
            "✅ Break Time!"
        );
        assert_eq!(
            format_tray_title(&state, Some(TimerMode::LongBreak)),
            "✅ Focus Time!"
        );
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(60), "01:00");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn test_sender_sinks_forward_messages() {
        let (mut tx, rx) = mpsc::channel();
        TickSink::on_tick(&mut tx, 42);
        let event = CompletionEvent {
            mode: TimerMode::Focus,
            duration_seconds: 1500,
            next_mode: TimerMode::ShortBreak,
            completed_focus_count: 1,
        };
        CompletionSink::on_complete(&mut tx, event);

        assert_eq!(rx.try_recv().unwrap(), TimerMessage::Tick { seconds_left: 42 });
        assert_eq!(rx.try_recv().unwrap(), TimerMessage::Completed(event));
    }

    #[test]
    fn test_sender_sinks_tolerate_closed_channel() {
        let (mut tx, rx) = mpsc::channel::<TimerMessage>();
        drop(rx);
        TickSink::on_tick(&mut tx, 1);
    }
}
