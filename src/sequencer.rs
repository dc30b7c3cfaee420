//! Picks the session that follows the current one.

use crate::models::TimerMode;
use crate::settings::TimerSettings;

/// Returns the mode after `current` and the updated focus count.
///
/// Finishing a focus session bumps the count; every `long_break_interval`-th
/// one is followed by a long break. Breaks always lead back to focus.
pub fn next(current: TimerMode, completed_focus_count: u32, settings: &TimerSettings) -> (TimerMode, u32) {
    match current {
        TimerMode::Focus => {
            let count = completed_focus_count.saturating_add(1);
            let interval = settings.long_break_interval.max(1);
            let mode = if count % interval == 0 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            };
            (mode, count)
        }
        TimerMode::ShortBreak | TimerMode::LongBreak => (TimerMode::Focus, completed_focus_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_interval(interval: u32) -> TimerSettings {
        TimerSettings {
            long_break_interval: interval,
            ..TimerSettings::default()
        }
    }

    #[test]
    fn test_focus_leads_to_short_break() {
        let settings = TimerSettings::default();
        assert_eq!(next(TimerMode::Focus, 0, &settings), (TimerMode::ShortBreak, 1));
        assert_eq!(next(TimerMode::Focus, 1, &settings), (TimerMode::ShortBreak, 2));
    }

    #[test]
    fn test_every_interval_th_focus_leads_to_long_break() {
        for interval in 1..=10 {
            let settings = with_interval(interval);
            for k in 0..40 {
                let (mode, count) = next(TimerMode::Focus, k, &settings);
                assert_eq!(count, k + 1);
                if (k + 1) % interval == 0 {
                    assert_eq!(mode, TimerMode::LongBreak, "interval {interval}, k {k}");
                } else {
                    assert_eq!(mode, TimerMode::ShortBreak, "interval {interval}, k {k}");
                }
            }
        }
    }

    #[test]
    fn test_breaks_lead_to_focus_without_counting() {
        let settings = TimerSettings::default();
        for k in [0, 3, 17] {
            assert_eq!(next(TimerMode::ShortBreak, k, &settings), (TimerMode::Focus, k));
            assert_eq!(next(TimerMode::LongBreak, k, &settings), (TimerMode::Focus, k));
        }
    }

    #[test]
    fn test_fourth_then_fifth_focus() {
        let settings = TimerSettings::default();

        let (mode, count) = next(TimerMode::Focus, 3, &settings);
        assert_eq!((mode, count), (TimerMode::LongBreak, 4));

        let (mode, count) = next(mode, count, &settings);
        assert_eq!((mode, count), (TimerMode::Focus, 4));

        let (mode, count) = next(mode, count, &settings);
        assert_eq!((mode, count), (TimerMode::ShortBreak, 5));
    }

    #[test]
    fn test_interval_of_one_always_long() {
        let settings = with_interval(1);
        assert_eq!(next(TimerMode::Focus, 0, &settings).0, TimerMode::LongBreak);
        assert_eq!(next(TimerMode::Focus, 8, &settings).0, TimerMode::LongBreak);
    }
}
