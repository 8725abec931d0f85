use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Something that can be sampled for a raw tick count.
pub trait TimeSource {
    fn now_ticks(&self) -> i64;
    fn seconds_per_tick(&self) -> f64;
}

/// Nanosecond ticks measured from when the source was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTimeSource {
    origin: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now_ticks(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    fn seconds_per_tick(&self) -> f64 {
        1e-9
    }
}

/// A counter that only moves when told to. Clones share the same counter,
/// and it may be moved backwards to model a counter that skews between cores.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    ticks: Rc<Cell<i64>>,
    seconds_per_tick: f64,
}

impl ManualTimeSource {
    /// One tick per millisecond.
    pub fn millis() -> Self {
        Self::with_resolution(1e-3)
    }

    pub fn with_resolution(seconds_per_tick: f64) -> Self {
        Self {
            ticks: Rc::new(Cell::new(0)),
            seconds_per_tick,
        }
    }

    pub fn advance(&self, ticks: i64) {
        self.ticks.set(self.ticks.get() + ticks);
    }

    pub fn set(&self, ticks: i64) {
        self.ticks.set(ticks);
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::millis()
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ticks(&self) -> i64 {
        self.ticks.get()
    }

    fn seconds_per_tick(&self) -> f64 {
        self.seconds_per_tick
    }
}

/// Stopwatch that drives the frame loop.
///
/// `total_time` is the wall time since the last [`Clock::reset`] minus every
/// interval spent stopped. `delta_time` is the time between the last two
/// ticks, and is never negative.
#[derive(Debug)]
pub struct Clock<S: TimeSource = MonotonicTimeSource> {
    source: S,
    seconds_per_tick: f64,
    delta_time: f64,
    base_time: i64,
    paused_time: i64,
    stop_time: i64,
    prev_time: i64,
    curr_time: i64,
    stopped: bool,
}

impl Clock<MonotonicTimeSource> {
    pub fn new() -> Self {
        Self::with_source(MonotonicTimeSource::new())
    }
}

impl Default for Clock<MonotonicTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> Clock<S> {
    pub fn with_source(source: S) -> Self {
        let now = source.now_ticks();
        Self {
            seconds_per_tick: source.seconds_per_tick(),
            source,
            delta_time: 0.0,
            base_time: now,
            paused_time: 0,
            stop_time: 0,
            prev_time: now,
            curr_time: now,
            stopped: false,
        }
    }

    /// Call before the message loop.
    pub fn reset(&mut self) {
        let now = self.source.now_ticks();
        self.base_time = now;
        self.prev_time = now;
        self.curr_time = now;
        self.paused_time = 0;
        self.stop_time = 0;
        self.delta_time = 0.0;
        self.stopped = false;
    }

    /// Call when unpaused.
    pub fn start(&mut self) {
        if !self.stopped {
            return;
        }
        let start_time = self.source.now_ticks();
        self.paused_time += start_time - self.stop_time;
        self.prev_time = start_time;
        self.stop_time = 0;
        self.stopped = false;
    }

    /// Call when paused.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stop_time = self.source.now_ticks();
        self.stopped = true;
    }

    /// Call every frame.
    pub fn tick(&mut self) {
        if self.stopped {
            self.delta_time = 0.0;
            return;
        }

        let now = self.source.now_ticks();
        self.curr_time = now;
        // The counter can report a smaller value than the previous sample when
        // the thread hops between processors.
        self.delta_time = ((now - self.prev_time) as f64 * self.seconds_per_tick).max(0.0);
        self.prev_time = now;
    }

    /// Seconds between the two most recent ticks.
    pub fn delta_time(&self) -> f32 {
        self.delta_time as f32
    }

    /// Seconds since `reset`, not counting time spent stopped.
    pub fn total_time(&self) -> f32 {
        let end = if self.stopped {
            self.stop_time
        } else {
            self.source.now_ticks()
        };
        ((end - self.paused_time - self.base_time) as f64 * self.seconds_per_tick) as f32
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn manual_clock() -> (ManualTimeSource, Clock<ManualTimeSource>) {
        let source = ManualTimeSource::millis();
        let clock = Clock::with_source(source.clone());
        (source, clock)
    }

    #[test]
    fn delta_is_zero_right_after_reset() {
        let (source, mut clock) = manual_clock();
        source.advance(1234);
        clock.reset();
        clock.tick();
        assert_eq!(clock.delta_time(), 0.0);
        assert_eq!(clock.total_time(), 0.0);
    }

    #[test]
    fn delta_is_zero_before_the_first_tick() {
        let (_source, clock) = manual_clock();
        assert_eq!(clock.delta_time(), 0.0);
    }

    #[test]
    fn tick_measures_time_since_previous_tick() {
        let (source, mut clock) = manual_clock();
        clock.reset();
        source.advance(16);
        clock.tick();
        assert_relative_eq!(clock.delta_time(), 0.016, epsilon = 1e-6);
        source.advance(33);
        clock.tick();
        assert_relative_eq!(clock.delta_time(), 0.033, epsilon = 1e-6);
        assert_relative_eq!(clock.total_time(), 0.049, epsilon = 1e-6);
    }

    #[test]
    fn counter_going_backwards_never_yields_negative_delta() {
        let (source, mut clock) = manual_clock();
        source.set(1_000);
        clock.reset();
        source.set(990);
        clock.tick();
        assert_eq!(clock.delta_time(), 0.0);
        source.set(1_010);
        clock.tick();
        assert_relative_eq!(clock.delta_time(), 0.020, epsilon = 1e-6);
    }

    #[test]
    fn paused_gap_is_excluded_from_total() {
        let (source, mut clock) = manual_clock();
        clock.reset();
        source.advance(250);
        clock.stop();
        source.advance(500);
        clock.start();
        assert_relative_eq!(clock.total_time(), 0.25, epsilon = 1e-6);
        source.advance(100);
        clock.tick();
        assert_relative_eq!(clock.total_time(), 0.35, epsilon = 1e-6);
    }

    #[test]
    fn first_tick_after_start_does_not_include_the_pause() {
        let (source, mut clock) = manual_clock();
        clock.reset();
        source.advance(10);
        clock.tick();
        clock.stop();
        source.advance(500);
        clock.start();
        source.advance(5);
        clock.tick();
        assert_relative_eq!(clock.delta_time(), 0.005, epsilon = 1e-6);
    }

    #[test]
    fn stop_is_idempotent_and_start_while_running_is_a_no_op() {
        let (source, mut clock) = manual_clock();
        clock.reset();
        source.advance(100);
        clock.stop();
        source.advance(100);
        clock.stop();
        source.advance(100);
        clock.start();
        clock.start();
        assert_relative_eq!(clock.total_time(), 0.1, epsilon = 1e-6);
        assert!(!clock.is_stopped());
    }

    #[test]
    fn tick_while_stopped_reports_zero_delta() {
        let (source, mut clock) = manual_clock();
        clock.reset();
        clock.stop();
        source.advance(40);
        clock.tick();
        assert_eq!(clock.delta_time(), 0.0);
    }

    #[test]
    fn reset_forgets_earlier_pauses() {
        let (source, mut clock) = manual_clock();
        clock.reset();
        clock.stop();
        source.advance(300);
        clock.start();
        clock.reset();
        source.advance(50);
        assert_relative_eq!(clock.total_time(), 0.05, epsilon = 1e-6);
    }

    #[test]
    fn total_is_monotonic_while_running_and_frozen_while_stopped() {
        let (source, mut clock) = manual_clock();
        clock.reset();

        // Small linear congruential generator so the sequence is reproducible.
        let mut state: u32 = 0x2545_F491;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state >> 8
        };

        let mut last_total = clock.total_time();
        for _ in 0..2_000 {
            let roll = next();
            match roll % 4 {
                0 => clock.stop(),
                1 => clock.start(),
                _ => {}
            }
            let was_stopped = clock.is_stopped();
            let before = clock.total_time();
            source.advance(i64::from(next() % 40));
            clock.tick();
            let after = clock.total_time();

            assert!(clock.delta_time() >= 0.0);
            if was_stopped {
                assert_eq!(before, after);
            } else {
                assert!(after >= before);
            }
            assert!(after >= last_total);
            last_total = after;
        }
    }

    #[test]
    fn monotonic_source_never_goes_backwards() {
        let mut clock = Clock::new();
        clock.reset();
        clock.tick();
        clock.tick();
        assert!(clock.delta_time() >= 0.0);
        assert!(clock.total_time() >= 0.0);
    }
}
