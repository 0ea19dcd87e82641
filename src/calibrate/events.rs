//! Search progress events
// (c) 2024 Ross Younger

/// Receives structured progress events from the delay search.
///
/// The search itself produces no output; anything user-facing (progress
/// bars, dots, logging) hangs off this trait instead.
pub trait SearchObserver {
    /// A candidate delay is about to be measured
    fn delay_attempted(&mut self, ticks: u64, seconds: f64);
    /// A sampling cycle completed
    fn rate_observed(&mut self, obtained: f64, reference: f64);
    /// The consecutive-match count changed (including reset to zero)
    fn streak_changed(&mut self, streak: u32);
}

/// An observer that discards all events
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SearchObserver for NullObserver {
    fn delay_attempted(&mut self, _ticks: u64, _seconds: f64) {}
    fn rate_observed(&mut self, _obtained: f64, _reference: f64) {}
    fn streak_changed(&mut self, _streak: u32) {}
}
