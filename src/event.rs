//! Menu event handling.

use crate::clock::Clock;
use crate::controller::{save_json, TimerController};
use crate::menu::{
    parse_duration_id, ID_AUTO_BREAKS, ID_AUTO_POMODOROS, ID_CLEAR_HISTORY, ID_NOTIF_TOGGLE,
    ID_PAUSE, ID_QUIT, ID_RESET, ID_RESET_COUNT, ID_SKIP, ID_SOUND_TOGGLE, ID_START,
    INTERVAL_PREFIX, MODE_PREFIX,
};
use crate::models::TimerMode;
use crate::persistence::{Database, ALERTS_KEY};
use crate::settings::{AlertSettings, SettingsUpdate};
use tracing::{debug, warn};

/// Result of handling a menu event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Event handled, nothing visible changed.
    Continue,
    /// User requested quit.
    Quit,
    /// Timer state or settings changed, menu and title need refresh.
    StateChanged,
    /// History changed, stats need reloading.
    HistoryChanged,
}

/// Applies the menu item `id` to the timer, alert preferences or history.
pub fn handle_menu_event<C: Clock>(
    timer: &mut TimerController<C>,
    alerts: &mut AlertSettings,
    db: &Database,
    id: &str,
) -> EventResult {
    debug!("Menu event: {}", id);

    match id {
        ID_START => {
            timer.start();
            EventResult::StateChanged
        }
        ID_PAUSE => {
            timer.pause();
            EventResult::StateChanged
        }
        ID_RESET => {
            timer.reset();
            EventResult::StateChanged
        }
        ID_SKIP => {
            timer.skip_to_next();
            EventResult::StateChanged
        }
        ID_AUTO_BREAKS => {
            let enabled = !timer.settings().auto_start_breaks;
            timer.update_settings(&SettingsUpdate {
                auto_start_breaks: Some(enabled),
                ..SettingsUpdate::default()
            });
            EventResult::StateChanged
        }
        ID_AUTO_POMODOROS => {
            let enabled = !timer.settings().auto_start_pomodoros;
            timer.update_settings(&SettingsUpdate {
                auto_start_pomodoros: Some(enabled),
                ..SettingsUpdate::default()
            });
            EventResult::StateChanged
        }
        ID_SOUND_TOGGLE => {
            alerts.sound_enabled = !alerts.sound_enabled;
            save_json(db, ALERTS_KEY, &*alerts);
            EventResult::StateChanged
        }
        ID_NOTIF_TOGGLE => {
            alerts.notifications_enabled = !alerts.notifications_enabled;
            save_json(db, ALERTS_KEY, &*alerts);
            EventResult::StateChanged
        }
        ID_RESET_COUNT => {
            timer.reset_focus_count();
            EventResult::StateChanged
        }
        ID_CLEAR_HISTORY => {
            if let Err(e) = db.clear_history() {
                warn!("Failed to clear history: {}", e);
            }
            EventResult::HistoryChanged
        }
        ID_QUIT => EventResult::Quit,
        _ => handle_parameterized(timer, id).unwrap_or(EventResult::Continue),
    }
}

/// Handles ids that carry a value: mode switches, durations and intervals.
fn handle_parameterized<C: Clock>(timer: &mut TimerController<C>, id: &str) -> Option<EventResult> {
    if let Some(mode) = id.strip_prefix(MODE_PREFIX).and_then(TimerMode::parse) {
        timer.switch_mode(mode);
        return Some(EventResult::StateChanged);
    }

    if let Some((mode, minutes)) = parse_duration_id(id) {
        timer.update_settings(&SettingsUpdate::duration(mode, i64::from(minutes)));
        return Some(EventResult::StateChanged);
    }

    if let Some(count) = id
        .strip_prefix(INTERVAL_PREFIX)
        .and_then(|s| s.parse::<i64>().ok())
    {
        timer.update_settings(&SettingsUpdate {
            long_break_interval: Some(count),
            ..SettingsUpdate::default()
        });
        return Some(EventResult::StateChanged);
    }

    None
}
