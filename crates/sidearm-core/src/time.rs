/// Fixed-step clock: turns wall-clock elapsed time into whole simulation ticks.
///
/// Leftover time is carried over to the next call. When the host falls far
/// behind, at most `max_catch_up` ticks are reported and the backlog is
/// dropped instead of spiralling.
#[derive(Debug, Clone)]
pub struct FixedClock {
    step: f32,
    accumulator: f32,
    max_catch_up: u32,
    ticks: u64,
}

impl FixedClock {
    /// Default number of ticks reported per call before backlog is dropped.
    pub const DEFAULT_MAX_CATCH_UP: u32 = 8;

    pub fn from_hz(hz: f32) -> Self {
        let hz = if hz.is_finite() && hz > 0.0 { hz } else { 50.0 };
        Self {
            step: 1.0 / hz,
            accumulator: 0.0,
            max_catch_up: Self::DEFAULT_MAX_CATCH_UP,
            ticks: 0,
        }
    }

    pub fn with_max_catch_up(mut self, max: u32) -> Self {
        self.max_catch_up = max.max(1);
        self
    }

    /// Seconds per tick.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Total ticks reported so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Feed `elapsed` seconds of real time; returns how many fixed ticks are due.
    pub fn tick(&mut self, elapsed: f32) -> u32 {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed;
        let mut due = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            due += 1;
            if due == self.max_catch_up {
                tracing::debug!(
                    dropped_secs = self.accumulator,
                    max_catch_up = self.max_catch_up,
                    "Fixed clock fell behind, dropping backlog"
                );
                self.accumulator = 0.0;
                break;
            }
        }
        self.ticks += due as u64;
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_partial_steps() {
        let mut clock = FixedClock::from_hz(4.0);
        assert_eq!(clock.tick(0.125), 0);
        assert_eq!(clock.tick(0.125), 1);
        assert_eq!(clock.tick(0.5), 2);
        assert_eq!(clock.ticks(), 3);
    }

    #[test]
    fn drops_backlog_beyond_catch_up() {
        let mut clock = FixedClock::from_hz(10.0).with_max_catch_up(3);
        assert_eq!(clock.tick(10.0), 3);
        assert_eq!(clock.tick(0.0), 0);
    }

    #[test]
    fn ignores_negative_and_nan() {
        let mut clock = FixedClock::from_hz(60.0);
        assert_eq!(clock.tick(-1.0), 0);
        assert_eq!(clock.tick(f32::NAN), 0);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn invalid_rate_falls_back() {
        let clock = FixedClock::from_hz(0.0);
        assert!((clock.step() - 0.02).abs() < 1e-6);
    }
}
