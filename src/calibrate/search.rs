//! Delay convergence search
// (c) 2024 Ross Younger
//!
//! The search looks for the *largest* inter-packet delay that still lets the
//! camera reach its unpaced frame rate. Each iteration programs a candidate
//! delay, measures, and either shrinks gently (rates matched; creep up on
//! the solution) or sharply (rates diverged; we overshot). Three matching
//! measurements in a row count as convergence, at which point a safety
//! margin is shaved off and the final value is programmed.
//!
//! Note the deliberate asymmetry between the two ways of reaching zero:
//! hitting zero *ticks* while rates still match means the camera matched its
//! reference all the way down and there is no margin to report (a failure),
//! whereas repeated mismatch shrinks driving the delay in *seconds* to
//! nothing is an ordinary completion at zero.

use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use super::events::SearchObserver;
use super::types::CalibrationState;
use crate::device::{BufferSet, DeviceAdapter};

/// Measured rates within this many frames/sec of each other count as equal
/// (inclusive)
pub const RATE_TOLERANCE: f64 = 0.1;

/// Consecutive matching measurements required before a solution is accepted
pub const REQUIRED_MATCHES: u32 = 3;

/// Fraction removed from the converged delay as safety margin
const SAFETY_MARGIN: f64 = 0.15;

/// While converging, shrink by this divisor each iteration (2%)
const MATCHED_SHRINK_DIVISOR: f64 = 50.0;

/// On a mismatch, shrink by this divisor (10%)
const MISMATCH_SHRINK_DIVISOR: f64 = 10.0;

/// Tolerance-based rate comparison. Inclusive at the boundary.
#[must_use]
pub fn rates_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= RATE_TOLERANCE
}

/// What the driver loop must do after one state transition
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StepOutcome {
    /// Measure again with the updated candidate delay
    Retry,
    /// Solution found; the margin-reduced delay still needs programming
    Settled,
    /// Mismatches drove the delay to zero seconds; accept zero as-is
    ZeroDelay,
    /// No usable delay exists for this format
    Failed,
}

/// Pure state transition for one measurement.
/// `state.current_rate` holds the rate just observed.
pub(crate) fn step(state: &mut CalibrationState) -> StepOutcome {
    if rates_match(state.reference_rate, state.current_rate) {
        state.equality_streak += 1;

        if state.delay_ticks() == 0 {
            // Already at the floor and still matching the reference:
            // there is no margin to report.
            state.set_delay_seconds(0.0);
            state.failed = true;
            return StepOutcome::Failed;
        }
        if state.equality_streak == REQUIRED_MATCHES {
            // Converged; shave the safety margin off (clamping at zero,
            // which is still a success on this path).
            let reduced = state.delay_seconds() - state.delay_seconds() * SAFETY_MARGIN;
            state.set_delay_seconds(reduced);
            return StepOutcome::Settled;
        }
        let shrunk = state.delay_seconds() - state.delay_seconds() / MATCHED_SHRINK_DIVISOR;
        state.set_delay_seconds(shrunk);
        return StepOutcome::Retry;
    }

    // Still far from the reference rate; back off harder.
    state.equality_streak = 0;
    let shrunk = state.delay_seconds() - state.delay_seconds() / MISMATCH_SHRINK_DIVISOR;
    state.set_delay_seconds(shrunk);
    if state.delay_ticks() == 0 {
        // Divergence persisted all the way to the floor.
        state.set_delay_seconds(0.0);
        state.failed = true;
        return StepOutcome::Failed;
    }
    if shrunk <= 0.0 {
        state.set_delay_seconds(0.0);
        return StepOutcome::ZeroDelay;
    }
    StepOutcome::Retry
}

/// Runs the search to a terminal state against a camera.
///
/// Blocking: each iteration performs one bounded sampling cycle plus the
/// settle pause. On return the state is terminal; inspect
/// [`CalibrationState::failed`] for the outcome.
pub fn find_delay<A: DeviceAdapter>(
    adapter: &mut A,
    buffers: &BufferSet,
    state: &mut CalibrationState,
    settle: Duration,
    observer: &mut dyn SearchObserver,
) -> Result<()> {
    loop {
        observer.delay_attempted(state.delay_ticks(), state.delay_seconds());
        adapter.set_packet_delay(state.delay_ticks())?;
        state.current_rate = adapter.run_sampling_cycle(buffers)?;
        observer.rate_observed(state.current_rate, state.reference_rate);

        // Let the camera and its queues reach steady state before the
        // sample influences the next candidate.
        std::thread::sleep(settle);

        let outcome = step(state);
        observer.streak_changed(state.equality_streak);
        match outcome {
            StepOutcome::Retry => (),
            StepOutcome::Settled => {
                debug!(
                    "converged at {} ticks ({:.3}us)",
                    state.delay_ticks(),
                    state.delay_seconds() * 1e6
                );
                adapter.set_packet_delay(state.delay_ticks())?;
                return Ok(());
            }
            StepOutcome::ZeroDelay => {
                debug!("delay shrank to zero; reporting an unpaced solution");
                return Ok(());
            }
            StepOutcome::Failed => {
                debug!("no usable delay found");
                return Ok(());
            }
        }
    }
}
