//! Desktop notifications for session completion.

use crate::controller::CompletionEvent;
use crate::models::TimerMode;
use notify_rust::Notification;
use std::thread;
use tracing::{debug, warn};

/// Summary and body of the notification for a completion.
pub fn completion_message(event: &CompletionEvent, long_break_mins: u32) -> (String, String) {
    match (event.mode, event.next_mode) {
        (TimerMode::Focus, TimerMode::LongBreak) => (
            "Long Break Time! 🎉".to_string(),
            format!(
                "{} focus sessions done. You've earned a {} minute break.",
                event.completed_focus_count, long_break_mins
            ),
        ),
        (TimerMode::Focus, _) => (
            "Pomodoro Completed! 🍅".to_string(),
            "Great work! Time for a break.".to_string(),
        ),
        _ => (
            "Break Over! ⏰".to_string(),
            "Ready to focus again?".to_string(),
        ),
    }
}

/// Shows the completion notification on a background thread.
pub fn notify_completion(event: &CompletionEvent, long_break_mins: u32) {
    let (summary, body) = completion_message(event, long_break_mins);
    thread::spawn(move || {
        match Notification::new()
            .summary(&summary)
            .body(&body)
            .timeout(5000)
            .show()
        {
            Ok(_) => debug!("Notification shown: {}", summary),
            Err(e) => warn!("Failed to show notification: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(mode: TimerMode, next_mode: TimerMode, count: u32) -> CompletionEvent {
        CompletionEvent {
            mode,
            duration_seconds: 1500,
            next_mode,
            completed_focus_count: count,
        }
    }

    #[test]
    fn test_focus_complete_message() {
        let (summary, body) = completion_message(&event(TimerMode::Focus, TimerMode::ShortBreak, 1), 15);
        assert_eq!(summary, "Pomodoro Completed! 🍅");
        assert_eq!(body, "Great work! Time for a break.");
    }

    #[test]
    fn test_long_break_message() {
        let (summary, body) = completion_message(&event(TimerMode::Focus, TimerMode::LongBreak, 4), 20);
        assert_eq!(summary, "Long Break Time! 🎉");
        assert!(body.contains("4 focus sessions"));
        assert!(body.contains("20 minute"));
    }

    #[test]
    fn test_break_over_message() {
        for mode in [TimerMode::ShortBreak, TimerMode::LongBreak] {
            let (summary, body) = completion_message(&event(mode, TimerMode::Focus, 2), 15);
            assert_eq!(summary, "Break Over! ⏰");
            assert_eq!(body, "Ready to focus again?");
        }
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_notify_completion() {
        notify_completion(&event(TimerMode::Focus, TimerMode::ShortBreak, 1), 15);
    }
}
