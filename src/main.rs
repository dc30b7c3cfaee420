//! Pomodoro Focus - a drift-resistant Pomodoro timer in the system tray.
//!
//! The winit event loop is the only thread that touches the timer. It polls
//! the controller while a countdown runs or an auto-start is pending and
//! sleeps otherwise; menu clicks arrive as user events on the same loop.

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use muda::MenuEvent;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{StartCause, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod audio;
mod clock;
mod config;
mod controller;
mod event;
mod menu;
mod models;
mod notifications;
mod persistence;
mod sequencer;
mod settings;
mod timer;
mod tray;

use audio::AudioPlayer;
use clock::SystemClock;
use config::Config;
use controller::{load_json, CompletionEvent, TimerController};
use event::EventResult;
use menu::{MenuItems, MenuView, HISTORY_ROWS};
use models::{DailySummary, HistoryEntry, TimerMode};
use persistence::{Database, DatabaseError, ALERTS_KEY, MAX_HISTORY};
use settings::AlertSettings;
use timer::TimerMessage;

/// How long the completion banner replaces the countdown in the tray title.
const BANNER_DURATION: Duration = Duration::from_secs(3);

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
}

/// Events injected into the winit loop from other threads.
#[derive(Debug)]
enum UserEvent {
    Menu(MenuEvent),
}

/// Application handler for the winit event loop.
struct PomodoroFocus {
    timer: TimerController<SystemClock>,
    db: Rc<Database>,
    alerts: AlertSettings,
    history: Vec<HistoryEntry>,
    tray: Option<TrayIcon>,
    tray_mode: Option<TimerMode>,
    menu_items: Option<MenuItems>,
    timer_rx: Receiver<TimerMessage>,
    audio: Option<AudioPlayer>,
    /// Mode that just finished, shown in the title until the deadline.
    banner: Option<(TimerMode, Instant)>,
}

impl PomodoroFocus {
    fn new(
        timer: TimerController<SystemClock>,
        db: Rc<Database>,
        timer_rx: Receiver<TimerMessage>,
        volume: f32,
    ) -> Self {
        let alerts = load_json(&*db, ALERTS_KEY).unwrap_or_default();

        // Audio is optional; a machine without an output device still gets notifications.
        let audio = match AudioPlayer::new(volume) {
            Ok(player) => Some(player),
            Err(e) => {
                warn!("Audio unavailable: {}", e);
                None
            }
        };

        let mut app = Self {
            timer,
            db,
            alerts,
            history: Vec::new(),
            tray: None,
            tray_mode: None,
            menu_items: None,
            timer_rx,
            audio,
            banner: None,
        };
        app.reload_history();
        app
    }

    fn reload_history(&mut self) {
        self.history = match self.db.recent_history(MAX_HISTORY) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load history: {}", e);
                Vec::new()
            }
        };
    }

    fn view(&self) -> MenuView<'_> {
        MenuView {
            state: self.timer.state(),
            settings: self.timer.settings(),
            alerts: &self.alerts,
            summary: DailySummary::from_entries(&self.history, chrono::Local::now()),
            recent: &self.history[..self.history.len().min(HISTORY_ROWS)],
        }
    }

    /// Builds the menu and tray icon once the loop is running.
    fn create_tray(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (built_menu, items) = menu::build_menu(&self.view())?;
        let mode = self.timer.state().mode;
        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(built_menu))
            .with_icon(tray::icon_for(mode)?)
            .with_title(timer::format_tray_title(self.timer.state(), None))
            .with_tooltip("Pomodoro Focus")
            .build()?;

        self.tray = Some(tray);
        self.tray_mode = Some(mode);
        self.menu_items = Some(items);
        Ok(())
    }

    fn refresh_display(&mut self) {
        let now = Instant::now();
        if matches!(self.banner, Some((_, until)) if now >= until) {
            self.banner = None;
        }

        if let Some(ref items) = self.menu_items {
            menu::update_menu_items(items, &self.view());
        }

        let Some(ref tray) = self.tray else {
            return;
        };
        let state = self.timer.state();
        let title = timer::format_tray_title(state, self.banner.map(|(mode, _)| mode));
        tray.set_title(Some(title));

        if self.tray_mode != Some(state.mode) {
            match tray::icon_for(state.mode) {
                Ok(icon) => {
                    if let Err(e) = tray.set_icon(Some(icon)) {
                        warn!("Failed to update tray icon: {}", e);
                    }
                }
                Err(e) => warn!("Failed to draw tray icon: {}", e),
            }
            self.tray_mode = Some(state.mode);
        }
    }

    fn handle_completion(&mut self, event: CompletionEvent) {
        if self.alerts.sound_enabled {
            if let Some(ref audio) = self.audio {
                audio.play_alarm();
            }
        }

        if self.alerts.notifications_enabled {
            notifications::notify_completion(&event, self.timer.settings().long_break_minutes);
        }

        if let Err(e) = self
            .db
            .record_history(event.mode, event.duration_seconds, chrono::Utc::now())
        {
            warn!("Failed to record history: {}", e);
        }
        self.reload_history();

        self.banner = Some((event.mode, Instant::now() + BANNER_DURATION));
    }

    fn process_timer_messages(&mut self) {
        while let Ok(msg) = self.timer_rx.try_recv() {
            match msg {
                // The display is refreshed after every batch.
                TimerMessage::Tick { .. } => {}
                TimerMessage::Completed(event) => self.handle_completion(event),
            }
        }
    }

    /// Next instant the loop must wake up at, if any.
    fn next_wakeup(&self) -> Option<Instant> {
        let banner = self.banner.map(|(_, until)| until);
        match (self.timer.next_wakeup(), banner) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

impl ApplicationHandler<UserEvent> for PomodoroFocus {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        if cause == StartCause::Init {
            if let Err(e) = self.create_tray() {
                error!("Failed to create tray icon: {}", e);
                event_loop.exit();
            }
        }
    }

    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Menu(menu_event) => {
                let result = event::handle_menu_event(
                    &mut self.timer,
                    &mut self.alerts,
                    &self.db,
                    menu_event.id().as_ref(),
                );
                match result {
                    EventResult::Quit => {
                        info!("Quit requested");
                        event_loop.exit();
                    }
                    EventResult::HistoryChanged => self.reload_history(),
                    EventResult::StateChanged | EventResult::Continue => {}
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.timer.poll();
        self.process_timer_messages();
        self.refresh_display();

        // Only hold a wake-up while something is counting down.
        let control_flow = match self.next_wakeup() {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        };
        event_loop.set_control_flow(control_flow);
    }
}

fn main() -> Result<(), AppError> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = match config.db {
        Some(ref path) => Database::open(path)?,
        None => Database::new()?,
    };
    let db = Rc::new(db);

    // Controller sinks forward to the handler through this channel.
    let (tx, rx) = mpsc::channel();
    let timer = TimerController::new(
        Box::new(Rc::clone(&db)),
        SystemClock,
        Box::new(tx.clone()),
        Box::new(tx),
    );

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;

    let proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event| {
        if proxy.send_event(UserEvent::Menu(event)).is_err() {
            warn!("Dropped menu event: event loop closed");
        }
    }));

    let mut app = PomodoroFocus::new(timer, db, rx, config.volume);
    event_loop.run_app(&mut app)?;

    Ok(())
}
