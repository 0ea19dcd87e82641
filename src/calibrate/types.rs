//! Calibration data model
// (c) 2024 Ross Younger

/// Mutable search state for one pixel format's calibration.
///
/// Created fresh when a format begins calibration and discarded once its
/// [`CalibrationResult`] is produced; nothing leaks across formats.
#[derive(Clone, Copy, Debug)]
pub struct CalibrationState {
    /// Baseline frame rate measured with pacing disabled. Set once.
    pub reference_rate: f64,
    /// Most recently measured frame rate
    pub current_rate: f64,
    /// Consecutive measurements matching the reference
    pub equality_streak: u32,
    /// Set when the search cannot produce a usable delay
    pub failed: bool,
    delay_seconds: f64,
    delay_ticks: u64,
    tick_frequency: u64,
}

impl CalibrationState {
    /// New state with zero delay, for a camera with the given tick clock
    #[must_use]
    pub fn new(tick_frequency: u64) -> Self {
        Self {
            reference_rate: 0.0,
            current_rate: 0.0,
            equality_streak: 0,
            failed: false,
            delay_seconds: 0.0,
            delay_ticks: 0,
            tick_frequency,
        }
    }

    /// Current candidate delay in seconds. Never negative.
    #[must_use]
    pub fn delay_seconds(&self) -> f64 {
        self.delay_seconds
    }

    /// Current candidate delay in device clock ticks.
    /// Always `floor(delay_seconds * tick_frequency)`.
    #[must_use]
    pub fn delay_ticks(&self) -> u64 {
        self.delay_ticks
    }

    /// Device clock ticks per second
    #[must_use]
    pub fn tick_frequency(&self) -> u64 {
        self.tick_frequency
    }

    /// Sets the candidate delay, clamping at zero.
    /// Seconds and ticks are always re-derived together.
    pub fn set_delay_seconds(&mut self, seconds: f64) {
        self.delay_seconds = seconds.max(0.0);
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            self.delay_ticks = (self.delay_seconds * self.tick_frequency as f64).floor() as u64;
        }
    }
}

/// Per-format calibration outcome snapshot.
///
/// Delay and rate fields are only populated when the search succeeded;
/// a failed search stores defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalibrationResult {
    /// Which pixel format this outcome belongs to
    pub pixel_format: String,
    /// Solved inter-packet delay, device clock ticks
    pub delay_ticks: u64,
    /// Solved inter-packet delay, seconds
    pub delay_seconds: f64,
    /// Baseline frame rate, pacing disabled
    pub reference_rate: f64,
    /// Frame rate obtained with the solved delay in force
    pub obtained_rate: f64,
    /// Whether the search converged
    pub succeeded: bool,
}

impl CalibrationResult {
    pub(crate) fn success(pixel_format: &str, state: &CalibrationState) -> Self {
        Self {
            pixel_format: pixel_format.into(),
            delay_ticks: state.delay_ticks(),
            delay_seconds: state.delay_seconds(),
            reference_rate: state.reference_rate,
            obtained_rate: state.current_rate,
            succeeded: true,
        }
    }

    pub(crate) fn failure(pixel_format: &str) -> Self {
        Self {
            pixel_format: pixel_format.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CalibrationState;
    use assertables::assert_in_delta;

    #[test]
    fn ticks_are_floored() {
        let mut state = CalibrationState::new(1_000_000);
        state.set_delay_seconds(0.0002); // the classic seed case
        assert_eq!(state.delay_ticks(), 200);

        state.set_delay_seconds(0.000_000_999_9);
        assert_eq!(state.delay_ticks(), 0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn negative_delay_clamps_to_zero() {
        let mut state = CalibrationState::new(1_000_000);
        state.set_delay_seconds(-0.5);
        assert_eq!(state.delay_seconds(), 0.0);
        assert_eq!(state.delay_ticks(), 0);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn seconds_and_ticks_stay_consistent() {
        let mut state = CalibrationState::new(125_000_000);
        let mut delay = 0.003;
        for _ in 0..100 {
            state.set_delay_seconds(delay);
            let expected = (state.delay_seconds() * 125_000_000.0).floor();
            assert_in_delta!(state.delay_ticks() as f64, expected, 0.5);
            delay -= delay / 10.0;
        }
    }
}
