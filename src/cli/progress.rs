//! Search progress display
// (c) 2024 Ross Younger

use std::time::Duration;

use human_repr::HumanDuration as _;
use indicatif::{MultiProgress, ProgressBar};
use tracing::debug;

use crate::calibrate::SearchObserver;

/// Renders the search's progress events as a spinner on the `MultiProgress`.
///
/// In quiet mode the spinner is hidden; the debug-level event log remains.
pub(crate) struct SpinnerObserver {
    spinner: ProgressBar,
}

impl SpinnerObserver {
    pub(crate) fn new(display: &MultiProgress, quiet: bool) -> Self {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            display.add(ProgressBar::new_spinner())
        };
        spinner.enable_steady_tick(Duration::from_millis(150));
        Self { spinner }
    }

    pub(crate) fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl SearchObserver for SpinnerObserver {
    fn delay_attempted(&mut self, ticks: u64, seconds: f64) {
        self.spinner
            .set_message(format!("Trying {ticks} ticks ({})", seconds.human_duration()));
    }

    fn rate_observed(&mut self, obtained: f64, reference: f64) {
        debug!("measured {obtained:.2} fps (reference {reference:.2})");
    }

    fn streak_changed(&mut self, streak: u32) {
        if streak > 0 {
            debug!("{streak} consecutive matching measurement(s)");
        }
    }
}
