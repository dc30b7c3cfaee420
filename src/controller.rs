//! Timer controller: the single entry point for every state transition.

use crate::clock::{Clock, ClockEngine};
use crate::models::{TimerMode, TimerState};
use crate::persistence::{DatabaseError, KeyValueStore, SETTINGS_KEY, STATE_KEY};
use crate::sequencer;
use crate::settings::{SettingsUpdate, TimerSettings};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pause between a natural completion and the automatic start of the next session.
pub const GRACE_DELAY: Duration = Duration::from_secs(1);

/// How often the scheduler polls while a countdown is running.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Emitted once per naturally completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    /// The mode that just finished.
    pub mode: TimerMode,
    pub duration_seconds: u32,
    /// The mode the sequencer armed next.
    pub next_mode: TimerMode,
    /// Focus sessions completed so far, including this one.
    pub completed_focus_count: u32,
}

/// Receives natural completions (alarm, notification, history).
pub trait CompletionSink {
    fn on_complete(&mut self, event: CompletionEvent);
}

/// Receives every integer-second change while running (display, title).
pub trait TickSink {
    fn on_tick(&mut self, seconds_left: u32);
}

/// Sink that ignores everything.
#[cfg(test)]
pub struct Discard;

#[cfg(test)]
impl CompletionSink for Discard {
    fn on_complete(&mut self, _event: CompletionEvent) {}
}

#[cfg(test)]
impl TickSink for Discard {
    fn on_tick(&mut self, _seconds_left: u32) {}
}

/// Composes settings, sequencer and clock engine behind one API.
pub struct TimerController<C: Clock> {
    state: TimerState,
    settings: TimerSettings,
    engine: ClockEngine<C>,
    store: Box<dyn KeyValueStore>,
    completion: Box<dyn CompletionSink>,
    ticks: Box<dyn TickSink>,
    /// Deadline of a scheduled auto-start, cancelled by any user operation.
    pending_start: Option<Instant>,
}

impl<C: Clock> TimerController<C> {
    /// Restores the last snapshot and settings from `store`, falling back to
    /// defaults for anything missing or malformed. Never resumes running.
    pub fn new(
        store: Box<dyn KeyValueStore>,
        clock: C,
        completion: Box<dyn CompletionSink>,
        ticks: Box<dyn TickSink>,
    ) -> Self {
        let settings = load_json::<TimerSettings>(store.as_ref(), SETTINGS_KEY)
            .map(|s| s.sanitized())
            .unwrap_or_default();
        let state = load_json::<TimerState>(store.as_ref(), STATE_KEY)
            .map(|s| restore_state(s, &settings))
            .unwrap_or_else(|| {
                TimerState::new(TimerMode::Focus, settings.duration_secs(TimerMode::Focus))
            });

        let mut engine = ClockEngine::new(clock);
        engine.restore(state.total_seconds, state.seconds_left);

        info!(
            "Timer ready: {} {}s/{}s, {} focus sessions completed",
            state.mode.label(),
            state.seconds_left,
            state.total_seconds,
            state.completed_focus_count
        );

        let controller = Self {
            state,
            settings,
            engine,
            store,
            completion,
            ticks,
            pending_start: None,
        };
        controller.persist_settings();
        controller.persist_state();
        controller
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// True while an auto-start is waiting out the grace delay.
    #[cfg(test)]
    pub fn has_pending_start(&self) -> bool {
        self.pending_start.is_some()
    }

    /// Starts or resumes the countdown. No-op if already running.
    pub fn start(&mut self) {
        self.pending_start = None;
        if self.state.is_running {
            return;
        }
        if self.engine.resume() {
            self.state.is_running = true;
            info!("Started {} with {}s left", self.state.mode.label(), self.state.seconds_left);
            self.persist_state();
        }
    }

    /// Stops the countdown, keeping the remaining time. Cancels a pending auto-start.
    pub fn pause(&mut self) {
        self.pending_start = None;
        if !self.state.is_running {
            return;
        }
        // Catch up first so a pause right at the deadline still completes.
        self.poll_engine();
        // A completion caught up here must not auto-start the next session.
        self.pending_start = None;
        if self.state.is_running {
            self.engine.suspend();
            self.state.is_running = false;
            info!("Paused {} at {}s", self.state.mode.label(), self.state.seconds_left);
            self.persist_state();
        }
    }

    /// Restarts the current mode from its full duration, stopped.
    pub fn reset(&mut self) {
        info!("Reset {}", self.state.mode.label());
        self.arm(self.state.mode);
    }

    /// Arms `mode` from its full duration, stopped. The focus count is untouched.
    pub fn switch_mode(&mut self, mode: TimerMode) {
        info!("Switching mode to {}", mode.label());
        self.arm(mode);
    }

    /// Advances to the session the sequencer picks, without recording history.
    pub fn skip_to_next(&mut self) {
        let (mode, count) =
            sequencer::next(self.state.mode, self.state.completed_focus_count, &self.settings);
        info!("Skipping {} -> {}", self.state.mode.label(), mode.label());
        self.state.completed_focus_count = count;
        self.arm(mode);
    }

    /// Merges `update` into the settings and restarts the current session
    /// with its (possibly new) duration.
    pub fn update_settings(&mut self, update: &SettingsUpdate) {
        self.settings.apply(update);
        debug!("Settings updated: {:?}", self.settings);
        self.persist_settings();
        self.arm(self.state.mode);
    }

    /// Clears the completed focus count, restarting the long-break cadence.
    pub fn reset_focus_count(&mut self) {
        info!("Resetting completed focus count");
        self.state.completed_focus_count = 0;
        self.persist_state();
    }

    /// Drives the countdown. Called by the host scheduler; cheap when idle.
    pub fn poll(&mut self) {
        if let Some(deadline) = self.pending_start {
            if self.engine.now() >= deadline {
                debug!("Grace delay elapsed, auto-starting {}", self.state.mode.label());
                self.start();
            }
        }
        self.poll_engine();
    }

    /// When the scheduler should poll next, or `None` if nothing is pending.
    pub fn next_wakeup(&self) -> Option<Instant> {
        if self.state.is_running {
            Some(self.engine.now() + TICK_INTERVAL)
        } else {
            self.pending_start
        }
    }

    fn poll_engine(&mut self) {
        if !self.state.is_running {
            return;
        }
        let reading = self.engine.poll();
        if reading.changed {
            self.state.seconds_left = reading.seconds_left;
            self.ticks.on_tick(reading.seconds_left);
            self.persist_state();
        }
        if reading.completed {
            self.complete();
        }
    }

    fn complete(&mut self) {
        let finished = self.state.mode;
        let duration_seconds = self.state.total_seconds;
        self.state.is_running = false;
        self.state.seconds_left = 0;

        let (next_mode, count) =
            sequencer::next(finished, self.state.completed_focus_count, &self.settings);
        info!("Completed {} ({}s), next up {}", finished.label(), duration_seconds, next_mode.label());

        self.completion.on_complete(CompletionEvent {
            mode: finished,
            duration_seconds,
            next_mode,
            completed_focus_count: count,
        });

        self.state.completed_focus_count = count;
        self.arm(next_mode);

        if self.settings.auto_starts_after(finished) {
            self.pending_start = Some(self.engine.now() + GRACE_DELAY);
        }
    }

    fn arm(&mut self, mode: TimerMode) {
        self.pending_start = None;
        let total = self.settings.duration_secs(mode);
        self.engine.arm(total);
        self.state.mode = mode;
        self.state.total_seconds = total;
        self.state.seconds_left = total;
        self.state.is_running = false;
        self.persist_state();
    }

    fn persist_state(&self) {
        save_json(self.store.as_ref(), STATE_KEY, &self.state);
    }

    fn persist_settings(&self) {
        save_json(self.store.as_ref(), SETTINGS_KEY, &self.settings);
    }
}

/// Repairs a restored snapshot so it satisfies the state invariants.
fn restore_state(mut state: TimerState, settings: &TimerSettings) -> TimerState {
    state.is_running = false;
    if state.total_seconds == 0 || state.seconds_left == 0 {
        state.total_seconds = settings.duration_secs(state.mode);
        state.seconds_left = state.total_seconds;
    }
    state.seconds_left = state.seconds_left.min(state.total_seconds);
    state
}

/// Reads `key` as JSON; absent, unreadable or malformed values yield `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!("Failed to load {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", key, e);
            None
        }
    }
}

/// Writes `value` as JSON under `key`, logging failures.
pub fn save_json<T: serde::Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(DatabaseError::from)
        .and_then(|json| store.save(key, &json));
    if let Err(e) = result {
        warn!("Failed to save {}: {}", key, e);
    }
}
