//! Reference rate sampling
// (c) 2024 Ross Younger

use anyhow::Result;
use tracing::debug;

use super::types::CalibrationState;
use crate::device::{BufferSet, DeviceAdapter};

/// Measures the zero-delay baseline frame rate and seeds the search state
/// with the camera's own theoretical delay suggestion.
///
/// Performs exactly one bounded sampling cycle at full buffer depth and no
/// convergence of its own; given an identical adapter state it is
/// idempotent.
pub(crate) fn sample<A: DeviceAdapter>(
    adapter: &mut A,
    buffers: &BufferSet,
) -> Result<CalibrationState> {
    let tick_frequency = adapter.tick_frequency()?;

    adapter.set_packet_delay(0)?;
    let reference = adapter.run_sampling_cycle(buffers)?;

    let mut state = CalibrationState::new(tick_frequency);
    state.reference_rate = reference;
    state.set_delay_seconds(adapter.theoretical_delay_seconds()?);
    debug!(
        "reference rate {reference:.2} fps; seeding search at {} ticks",
        state.delay_ticks()
    );
    Ok(state)
}
