//! Menu building and updating for the tray dropdown.

use crate::models::{DailySummary, HistoryEntry, TimerMode, TimerState};
use crate::settings::{AlertSettings, TimerSettings};
use crate::timer::format_time;
use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use std::collections::HashMap;
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_STATS: &str = "stats";
pub const ID_START: &str = "start";
pub const ID_PAUSE: &str = "pause";
pub const ID_RESET: &str = "reset";
pub const ID_SKIP: &str = "skip";
pub const ID_AUTO_BREAKS: &str = "auto_breaks";
pub const ID_AUTO_POMODOROS: &str = "auto_pomodoros";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_NOTIF_TOGGLE: &str = "notif_toggle";
pub const ID_RESET_COUNT: &str = "reset_count";
pub const ID_CLEAR_HISTORY: &str = "clear_history";
pub const ID_QUIT: &str = "quit";

/// Prefix of the mode switch items, followed by `TimerMode::as_str`.
pub const MODE_PREFIX: &str = "mode_";
/// Prefix of the long-break interval choices, followed by the count.
pub const INTERVAL_PREFIX: &str = "interval_";

/// Number of recent sessions listed in the history submenu.
pub const HISTORY_ROWS: usize = 5;

const FOCUS_CHOICES: [u32; 7] = [15, 20, 25, 30, 45, 50, 60];
const SHORT_BREAK_CHOICES: [u32; 5] = [3, 5, 10, 15, 30];
const LONG_BREAK_CHOICES: [u32; 5] = [10, 15, 20, 30, 60];
const INTERVAL_CHOICES: [u32; 6] = [2, 3, 4, 5, 6, 8];

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// Holds references to menu items that need dynamic updates.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub stats: MenuItem,
    pub history: Vec<MenuItem>,
    pub start: MenuItem,
    pub pause: MenuItem,
    pub reset: MenuItem,
    pub skip: MenuItem,
    pub mode_checks: HashMap<TimerMode, CheckMenuItem>,
    pub duration_menus: HashMap<TimerMode, Submenu>,
    pub duration_checks: HashMap<TimerMode, HashMap<u32, CheckMenuItem>>,
    pub interval_menu: Submenu,
    pub interval_checks: HashMap<u32, CheckMenuItem>,
    pub auto_breaks: CheckMenuItem,
    pub auto_pomodoros: CheckMenuItem,
    pub sound_toggle: CheckMenuItem,
    pub notif_toggle: CheckMenuItem,
}

/// Everything the menu displays.
pub struct MenuView<'a> {
    pub state: &'a TimerState,
    pub settings: &'a TimerSettings,
    pub alerts: &'a AlertSettings,
    pub summary: DailySummary,
    pub recent: &'a [HistoryEntry],
}

/// Menu item id of the duration choice `minutes` for `mode`.
pub fn duration_id(mode: TimerMode, minutes: u32) -> String {
    format!("dur_{}_{}", mode.as_str(), minutes)
}

/// Parses an id produced by [`duration_id`].
pub fn parse_duration_id(id: &str) -> Option<(TimerMode, u32)> {
    let rest = id.strip_prefix("dur_")?;
    let (mode, minutes) = rest.rsplit_once('_')?;
    Some((TimerMode::parse(mode)?, minutes.parse().ok()?))
}

fn info_item(id: &str, text: String) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, false, None::<Accelerator>)
}

fn action_item(id: &str, text: &str, enabled: bool) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, enabled, None::<Accelerator>)
}

fn check_item(id: String, text: String, checked: bool) -> CheckMenuItem {
    CheckMenuItem::with_id(MenuId::new(id), text, true, checked, None::<Accelerator>)
}

/// Builds the complete menu structure.
pub fn build_menu(view: &MenuView) -> Result<(Menu, MenuItems), MenuError> {
    let menu = Menu::new();
    let state = view.state;

    let status = info_item(ID_STATUS, format_status(state));
    let progress = info_item(ID_PROGRESS, format_progress(state));
    menu.append(&status)?;
    menu.append(&progress)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let stats = info_item(ID_STATS, format_stats(&view.summary));
    menu.append(&stats)?;

    let history_menu = Submenu::new("Recent Sessions", true);
    let mut history = Vec::with_capacity(HISTORY_ROWS);
    for row in 0..HISTORY_ROWS {
        let item = info_item(&format!("history_{}", row), history_row_text(view.recent, row));
        history_menu.append(&item)?;
        history.push(item);
    }
    history_menu.append(&PredefinedMenuItem::separator())?;
    history_menu.append(&action_item(ID_CLEAR_HISTORY, "Clear History", true))?;
    menu.append(&history_menu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let start = action_item(ID_START, "▶  Start", !state.is_running);
    let pause = action_item(ID_PAUSE, "⏸  Pause", state.is_running);
    let reset = action_item(ID_RESET, "↺  Reset", !state.is_fresh());
    let skip = action_item(ID_SKIP, "⏭  Skip to Next", true);
    menu.append(&start)?;
    menu.append(&pause)?;
    menu.append(&reset)?;
    menu.append(&skip)?;

    let mode_menu = Submenu::new("Mode", true);
    let mut mode_checks = HashMap::new();
    for mode in TimerMode::ALL {
        let item = check_item(
            format!("{}{}", MODE_PREFIX, mode.as_str()),
            format!("{}  {}", mode.glyph(), mode.label()),
            mode == state.mode,
        );
        mode_menu.append(&item)?;
        mode_checks.insert(mode, item);
    }
    menu.append(&mode_menu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let submenu = Submenu::new("⚙  Settings", true);

    let mut duration_menus = HashMap::new();
    let mut duration_checks = HashMap::new();
    for (mode, choices) in [
        (TimerMode::Focus, &FOCUS_CHOICES[..]),
        (TimerMode::ShortBreak, &SHORT_BREAK_CHOICES[..]),
        (TimerMode::LongBreak, &LONG_BREAK_CHOICES[..]),
    ] {
        let current = view.settings.duration_secs(mode) / 60;
        let sub = Submenu::new(duration_menu_text(mode, current), true);
        let mut checks = HashMap::new();
        for &mins in choices {
            let item = check_item(duration_id(mode, mins), format!("{} min", mins), mins == current);
            sub.append(&item)?;
            checks.insert(mins, item);
        }
        submenu.append(&sub)?;
        duration_menus.insert(mode, sub);
        duration_checks.insert(mode, checks);
    }

    let interval_menu = Submenu::new(interval_menu_text(view.settings.long_break_interval), true);
    let mut interval_checks = HashMap::new();
    for count in INTERVAL_CHOICES {
        let item = check_item(
            format!("{}{}", INTERVAL_PREFIX, count),
            format!("{} sessions", count),
            count == view.settings.long_break_interval,
        );
        interval_menu.append(&item)?;
        interval_checks.insert(count, item);
    }
    submenu.append(&interval_menu)?;

    submenu.append(&PredefinedMenuItem::separator())?;

    let auto_breaks = check_item(
        ID_AUTO_BREAKS.to_string(),
        "Auto-start Breaks".to_string(),
        view.settings.auto_start_breaks,
    );
    let auto_pomodoros = check_item(
        ID_AUTO_POMODOROS.to_string(),
        "Auto-start Focus".to_string(),
        view.settings.auto_start_pomodoros,
    );
    let sound_toggle = check_item(
        ID_SOUND_TOGGLE.to_string(),
        "Sound Enabled".to_string(),
        view.alerts.sound_enabled,
    );
    let notif_toggle = check_item(
        ID_NOTIF_TOGGLE.to_string(),
        "Notifications Enabled".to_string(),
        view.alerts.notifications_enabled,
    );
    submenu.append(&auto_breaks)?;
    submenu.append(&auto_pomodoros)?;
    submenu.append(&sound_toggle)?;
    submenu.append(&notif_toggle)?;

    submenu.append(&PredefinedMenuItem::separator())?;
    submenu.append(&action_item(ID_RESET_COUNT, "Reset Session Count", true))?;
    menu.append(&submenu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let quit = action_item(ID_QUIT, "Quit Pomodoro Focus", true);
    menu.append(&quit)?;

    let items = MenuItems {
        status,
        progress,
        stats,
        history,
        start,
        pause,
        reset,
        skip,
        mode_checks,
        duration_menus,
        duration_checks,
        interval_menu,
        interval_checks,
        auto_breaks,
        auto_pomodoros,
        sound_toggle,
        notif_toggle,
    };

    Ok((menu, items))
}

/// Updates the menu items based on the current state.
pub fn update_menu_items(items: &MenuItems, view: &MenuView) {
    let state = view.state;

    items.status.set_text(format_status(state));
    items.progress.set_text(format_progress(state));
    items.stats.set_text(format_stats(&view.summary));
    for (row, item) in items.history.iter().enumerate() {
        item.set_text(history_row_text(view.recent, row));
    }

    items.start.set_enabled(!state.is_running);
    items.pause.set_enabled(state.is_running);
    items.reset.set_enabled(!state.is_fresh());
    items.skip.set_enabled(true);

    for (mode, check) in &items.mode_checks {
        check.set_checked(*mode == state.mode);
    }

    for (mode, checks) in &items.duration_checks {
        let current = view.settings.duration_secs(*mode) / 60;
        for (mins, check) in checks {
            check.set_checked(*mins == current);
        }
        if let Some(sub) = items.duration_menus.get(mode) {
            sub.set_text(duration_menu_text(*mode, current));
        }
    }

    items
        .interval_menu
        .set_text(interval_menu_text(view.settings.long_break_interval));
    for (count, check) in &items.interval_checks {
        check.set_checked(*count == view.settings.long_break_interval);
    }

    items.auto_breaks.set_checked(view.settings.auto_start_breaks);
    items
        .auto_pomodoros
        .set_checked(view.settings.auto_start_pomodoros);
    items.sound_toggle.set_checked(view.alerts.sound_enabled);
    items
        .notif_toggle
        .set_checked(view.alerts.notifications_enabled);
}

fn duration_menu_text(mode: TimerMode, minutes: u32) -> String {
    format!("{}: {} min", mode.label(), minutes)
}

fn interval_menu_text(interval: u32) -> String {
    format!("Long Break Every: {} sessions", interval)
}

/// Formats the status line for the menu.
pub fn format_status(state: &TimerState) -> String {
    let time = format_time(state.seconds_left);
    if state.is_running {
        format!("{}  {} - {} remaining", state.mode.glyph(), state.mode.label(), time)
    } else if state.is_fresh() {
        format!("{}  {} - ready ({})", state.mode.glyph(), state.mode.label(), time)
    } else {
        format!("⏸  {} - {} (paused)", state.mode.label(), time)
    }
}

/// Formats the progress bar for the menu.
pub fn format_progress(state: &TimerState) -> String {
    let pct = state.progress().clamp(0.0, 1.0);
    let filled = (pct * 20.0).round() as usize;
    let empty = 20 - filled;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(empty),
        (pct * 100.0).round() as u32
    )
}

/// Formats today's stats for the menu.
pub fn format_stats(summary: &DailySummary) -> String {
    if summary.focus_sessions == 0 && summary.total_minutes == 0 {
        return "Today: —  0 (0 min)".to_string();
    }
    let tomatoes = "🍅".repeat(summary.focus_sessions.min(10) as usize);
    let extra = if summary.focus_sessions > 10 {
        format!("+{}", summary.focus_sessions - 10)
    } else {
        String::new()
    };
    format!(
        "Today: {}{}  {} ({} min)",
        tomatoes, extra, summary.focus_sessions, summary.total_minutes
    )
}

/// Formats one history entry, e.g. `🍅 Focus · 25 min · 14:05`.
pub fn format_history_entry(entry: &HistoryEntry) -> String {
    format!(
        "{} {} · {} min · {}",
        entry.mode.glyph(),
        entry.mode.label(),
        (entry.duration_seconds + 30) / 60,
        entry.local_time()
    )
}

fn history_row_text(recent: &[HistoryEntry], row: usize) -> String {
    match recent.get(row) {
        Some(entry) => format_history_entry(entry),
        None if row == 0 => "No sessions yet".to_string(),
        None => String::new(),
    }
}
