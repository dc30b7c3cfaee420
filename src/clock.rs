//! Drift-resistant countdown engine.
//!
//! Remaining time is derived from elapsed wall-clock time rather than by
//! decrementing once per callback, so throttled or skipped polls never make
//! the countdown fall behind. The engine does not schedule itself; the event
//! loop polls it.

use std::time::{Duration, Instant};

/// Source of monotonic time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic tests. Clones share one timeline.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: std::rc::Rc<std::cell::Cell<Duration>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Default::default(),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

/// Result of a single [`ClockEngine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub seconds_left: u32,
    /// The integer-second value differs from the previous poll.
    pub changed: bool,
    /// This poll reached zero. Reported once per armed countdown.
    pub completed: bool,
}

/// Tracks elapsed time against a target duration.
#[derive(Debug)]
pub struct ClockEngine<C> {
    clock: C,
    total_seconds: u32,
    seconds_left: u32,
    /// Time counted during previous running stretches.
    elapsed_before: Duration,
    /// Start of the current running stretch; `Some` exactly while running.
    anchor: Option<Instant>,
}

impl<C: Clock> ClockEngine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            total_seconds: 0,
            seconds_left: 0,
            elapsed_before: Duration::ZERO,
            anchor: None,
        }
    }

    /// Sets a fresh countdown of `total_seconds`. Leaves the engine stopped.
    pub fn arm(&mut self, total_seconds: u32) {
        self.total_seconds = total_seconds;
        self.seconds_left = total_seconds;
        self.elapsed_before = Duration::ZERO;
        self.anchor = None;
    }

    /// Arms a countdown that already has `total_seconds - seconds_left` behind it.
    pub fn restore(&mut self, total_seconds: u32, seconds_left: u32) {
        self.arm(total_seconds);
        self.seconds_left = seconds_left.min(total_seconds);
        self.elapsed_before = Duration::from_secs(u64::from(total_seconds - self.seconds_left));
    }

    /// Starts counting from the current position.
    ///
    /// Returns false without effect if already running or nothing is left.
    pub fn resume(&mut self) -> bool {
        if self.anchor.is_some() || self.seconds_left == 0 {
            return false;
        }
        self.anchor = Some(self.clock.now());
        true
    }

    /// Stops counting. Returns false if it was not running.
    ///
    /// Time since the last resume is banked, but `seconds_left` keeps the
    /// last polled value until the next running poll.
    pub fn suspend(&mut self) -> bool {
        match self.anchor.take() {
            Some(anchor) => {
                self.elapsed_before += self.clock.now().saturating_duration_since(anchor);
                true
            }
            None => false,
        }
    }

    /// Recomputes the remaining whole seconds from elapsed time.
    ///
    /// Reaching zero stops the engine, so later polls report neither a
    /// change nor a second completion.
    pub fn poll(&mut self) -> Reading {
        let Some(anchor) = self.anchor else {
            return Reading {
                seconds_left: self.seconds_left,
                changed: false,
                completed: false,
            };
        };

        let elapsed = self.elapsed_before + self.clock.now().saturating_duration_since(anchor);
        let elapsed_secs = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
        let left = self
            .total_seconds
            .saturating_sub(elapsed_secs)
            .min(self.seconds_left);

        let changed = left != self.seconds_left;
        self.seconds_left = left;

        let completed = left == 0;
        if completed {
            self.elapsed_before = elapsed;
            self.anchor = None;
        }

        Reading {
            seconds_left: left,
            changed,
            completed,
        }
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }
}

#[cfg(test)]
impl<C> ClockEngine<C> {
    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(total: u32) -> (ClockEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = ClockEngine::new(clock.clone());
        engine.arm(total);
        (engine, clock)
    }

    #[test]
    fn test_arm_does_not_start() {
        let (mut engine, clock) = engine(1500);
        assert!(!engine.is_running());
        assert_eq!(engine.seconds_left(), 1500);
        assert_eq!(engine.total_seconds(), 1500);

        clock.advance_secs(30);
        let reading = engine.poll();
        assert_eq!(reading.seconds_left, 1500);
        assert!(!reading.changed);
    }

    #[test]
    fn test_poll_reports_only_integer_changes() {
        let (mut engine, clock) = engine(60);
        engine.resume();

        clock.advance(Duration::from_millis(400));
        assert!(!engine.poll().changed);

        clock.advance(Duration::from_millis(700));
        let reading = engine.poll();
        assert!(reading.changed);
        assert_eq!(reading.seconds_left, 59);

        assert!(!engine.poll().changed);
    }

    #[test]
    fn test_skipped_polls_do_not_drift() {
        let (mut engine, clock) = engine(1500);
        engine.resume();

        // A throttled host that only polls after a long gap.
        clock.advance_secs(600);
        let reading = engine.poll();
        assert_eq!(reading.seconds_left, 900);
        assert!(reading.changed);
    }

    #[test]
    fn test_full_duration_completes_exactly_once() {
        let (mut engine, clock) = engine(1500);
        engine.resume();

        clock.advance_secs(1500);
        let reading = engine.poll();
        assert_eq!(reading.seconds_left, 0);
        assert!(reading.completed);
        assert!(!engine.is_running());

        clock.advance_secs(10);
        let again = engine.poll();
        assert_eq!(again.seconds_left, 0);
        assert!(!again.completed);
        assert!(!again.changed);
    }

    #[test]
    fn test_overshoot_clamps_to_zero() {
        let (mut engine, clock) = engine(60);
        engine.resume();
        clock.advance_secs(3600);
        let reading = engine.poll();
        assert_eq!(reading.seconds_left, 0);
        assert!(reading.completed);
    }

    #[test]
    fn test_suspended_time_is_not_counted() {
        let (mut engine, clock) = engine(1500);
        engine.resume();
        clock.advance_secs(10);
        assert!(engine.suspend());

        clock.advance_secs(500);
        engine.resume();
        clock.advance_secs(5);
        assert_eq!(engine.poll().seconds_left, 1500 - 15);
    }

    #[test]
    fn test_suspend_freezes_last_polled_value() {
        let (mut engine, clock) = engine(1500);
        engine.resume();
        clock.advance_secs(10);
        assert_eq!(engine.poll().seconds_left, 1490);
        engine.suspend();

        clock.advance_secs(500);
        let reading = engine.poll();
        assert_eq!(reading.seconds_left, 1490);
        assert!(!reading.changed);

        engine.resume();
        clock.advance_secs(5);
        assert_eq!(engine.poll().seconds_left, 1500 - 15);
    }

    #[test]
    fn test_sub_second_fragments_accumulate_across_pauses() {
        let (mut engine, clock) = engine(60);
        for _ in 0..4 {
            engine.resume();
            clock.advance(Duration::from_millis(500));
            engine.suspend();
            clock.advance_secs(100);
        }
        engine.resume();
        assert_eq!(engine.poll().seconds_left, 58);
    }

    #[test]
    fn test_resume_and_suspend_are_idempotent() {
        let (mut engine, clock) = engine(100);
        assert!(engine.resume());
        clock.advance_secs(3);
        assert!(!engine.resume());
        clock.advance_secs(2);
        assert_eq!(engine.poll().seconds_left, 95);

        assert!(engine.suspend());
        assert!(!engine.suspend());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_resume_at_zero_is_noop() {
        let (mut engine, clock) = engine(5);
        engine.resume();
        clock.advance_secs(5);
        assert!(engine.poll().completed);
        assert!(!engine.resume());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_restore_continues_from_position() {
        let clock = ManualClock::new();
        let mut engine = ClockEngine::new(clock.clone());
        engine.restore(1500, 1200);
        assert_eq!(engine.seconds_left(), 1200);
        assert!(!engine.is_running());

        engine.resume();
        clock.advance_secs(200);
        assert_eq!(engine.poll().seconds_left, 1000);
    }

    #[test]
    fn test_rearm_discards_progress() {
        let (mut engine, clock) = engine(100);
        engine.resume();
        clock.advance_secs(40);
        engine.poll();
        engine.arm(300);
        assert!(!engine.is_running());
        assert_eq!(engine.seconds_left(), 300);

        engine.resume();
        clock.advance_secs(1);
        assert_eq!(engine.poll().seconds_left, 299);
    }

    #[test]
    fn test_seconds_left_monotonic_while_running() {
        let (mut engine, clock) = engine(120);
        engine.resume();
        let mut last = engine.seconds_left();
        for step_ms in [0, 10, 999, 1, 2500, 0, 3000, 70_000, 100_000] {
            clock.advance(Duration::from_millis(step_ms));
            let reading = engine.poll();
            assert!(reading.seconds_left <= last);
            last = reading.seconds_left;
        }
        assert_eq!(last, 0);
    }
}
