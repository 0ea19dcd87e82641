//! Per-format calibration harness
// (c) 2024 Ross Younger

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use super::events::SearchObserver;
use super::results::RunReport;
use super::types::{CalibrationResult, CalibrationState};
use super::{reference, search};
use crate::config::Parameters;
use crate::device::{BufferSet, DeviceAdapter, PixelFormat};
use crate::util::Selection;

/// Calibrates the selected pixel format(s), one at a time, and aggregates
/// the outcomes.
///
/// Formats share the camera's acquisition resources, so they are processed
/// strictly sequentially: each format's buffers are released before the
/// next format's are allocated. A buffer allocation failure skips that
/// format only; a search that cannot converge records an unsuccessful
/// outcome. Both leave the batch running.
pub fn run<A: DeviceAdapter>(
    adapter: &mut A,
    selection: Selection,
    params: Parameters,
    observer: &mut dyn SearchObserver,
) -> Result<RunReport> {
    // A camera without a tick clock cannot express an inter-packet delay.
    // Checked once, before any format is touched.
    if adapter.tick_frequency()? == 0 {
        bail!("camera does not support inter-packet delay (tick frequency is zero)");
    }

    let mut report = RunReport::new(adapter.identity()?, adapter.global_parameters()?);

    let formats: Vec<PixelFormat> = adapter
        .enumerate_pixel_formats()?
        .into_iter()
        .filter(|f| f.supported)
        .collect();
    if formats.is_empty() {
        bail!("no usable pixel formats enumerated");
    }

    let chosen: Vec<&PixelFormat> = match selection {
        // With a single supported format there is nothing to choose.
        _ if formats.len() == 1 => vec![&formats[0]],
        Selection::All => formats.iter().collect(),
        Selection::Index(i) => {
            let f = formats.get(i).with_context(|| {
                format!("format index {i} out of range (0-{})", formats.len() - 1)
            })?;
            vec![f]
        }
    };

    for format in chosen {
        info!("calibrating {}", format.name);
        calibrate_format(adapter, format, params, observer, &mut report)?;
    }

    // Leave the camera unpaced, as it powered up.
    adapter.set_packet_delay(0)?;
    Ok(report)
}

fn calibrate_format<A: DeviceAdapter>(
    adapter: &mut A,
    format: &PixelFormat,
    params: Parameters,
    observer: &mut dyn SearchObserver,
    report: &mut RunReport,
) -> Result<()> {
    adapter.apply_pixel_format(&format.name, params.apply_policy())?;

    let buffers = match adapter.allocate_buffers(usize::from(params.buffer_depth)) {
        Ok(b) => b,
        Err(e) => {
            // Fatal to this format only.
            warn!("skipping {}: {e}", format.name);
            return Ok(());
        }
    };
    debug!("allocated {} buffers for {}", buffers.depth(), format.name);

    // Whatever happens below, the buffers go back before the next format
    // allocates its own.
    let outcome = calibrate_with_buffers(adapter, format, &buffers, params, observer);
    adapter.release_buffers(buffers);
    report.push(outcome?);
    Ok(())
}

fn calibrate_with_buffers<A: DeviceAdapter>(
    adapter: &mut A,
    format: &PixelFormat,
    buffers: &BufferSet,
    params: Parameters,
    observer: &mut dyn SearchObserver,
) -> Result<CalibrationResult> {
    // Fresh state per format; nothing carries over from a previous run.
    let mut state: CalibrationState = reference::sample(adapter, buffers)?;
    search::find_delay(adapter, buffers, &mut state, params.settle_duration(), observer)?;
    if state.failed {
        warn!("no usable inter-packet delay found for {}", format.name);
        return Ok(CalibrationResult::failure(&format.name));
    }
    Ok(CalibrationResult::success(&format.name, &state))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::run;
    use crate::calibrate::events::NullObserver;
    use crate::config::Parameters;
    use crate::device::{
        AllocationError, BufferSet, DeviceAdapter, DeviceIdentity, GlobalParameters, PixelFormat,
    };
    use crate::util::Selection;
    use anyhow::Result;
    use assertables::assert_gt;

    fn no_settle() -> Parameters {
        Parameters {
            settle_ms: 0,
            ..Parameters::default()
        }
    }

    /// Scripted camera: always reaches its reference rate regardless of
    /// delay, so every search converges after three measurements.
    #[derive(Default)]
    struct Compliant {
        formats: Vec<PixelFormat>,
        delay_ticks: u64,
        allocations: u32,
        releases: u32,
        refuse_allocation_for_format: Option<usize>,
        current_format: usize,
    }

    impl Compliant {
        fn with_formats(names: &[&str]) -> Self {
            Self {
                formats: names
                    .iter()
                    .map(|n| PixelFormat {
                        name: (*n).into(),
                        supported: true,
                    })
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl DeviceAdapter for Compliant {
        fn identity(&self) -> Result<DeviceIdentity> {
            Ok(DeviceIdentity {
                vendor: "Stub".into(),
                model: "One".into(),
            })
        }
        fn global_parameters(&self) -> Result<GlobalParameters> {
            Ok(GlobalParameters {
                width: 640,
                height: 480,
                packet_size: 1500,
            })
        }
        fn tick_frequency(&self) -> Result<u64> {
            Ok(1_000_000)
        }
        fn theoretical_delay_seconds(&self) -> Result<f64> {
            Ok(0.0002)
        }
        fn enumerate_pixel_formats(&mut self) -> Result<Vec<PixelFormat>> {
            Ok(self.formats.clone())
        }
        fn pixel_format_writable(&self) -> Result<bool> {
            Ok(true)
        }
        fn write_pixel_format(&mut self, name: &str) -> Result<()> {
            self.current_format = self.formats.iter().position(|f| f.name == name).unwrap();
            Ok(())
        }
        fn allocate_buffers(&mut self, depth: usize) -> Result<BufferSet, AllocationError> {
            if self.refuse_allocation_for_format == Some(self.current_format) {
                return Err(AllocationError("out of memory".into()));
            }
            self.allocations += 1;
            Ok(BufferSet::new(depth))
        }
        fn release_buffers(&mut self, _buffers: BufferSet) {
            self.releases += 1;
        }
        fn set_packet_delay(&mut self, ticks: u64) -> Result<()> {
            self.delay_ticks = ticks;
            Ok(())
        }
        fn run_sampling_cycle(&mut self, _buffers: &BufferSet) -> Result<f64> {
            Ok(25.0)
        }
    }

    #[test]
    fn all_formats_in_order_with_independent_state() {
        let mut camera = Compliant::with_formats(&["A", "B"]);
        let report = run(
            &mut camera,
            Selection::All,
            no_settle(),
            &mut NullObserver,
        )
        .unwrap();

        let entries = report.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pixel_format, "A");
        assert_eq!(entries[1].pixel_format, "B");
        // Both converged from the same seed with the same shrink schedule:
        // identical outcomes prove nothing carried over from A to B.
        assert!(entries[0].succeeded);
        assert_eq!(entries[0].delay_ticks, entries[1].delay_ticks);
        assert_eq!(entries[0].delay_seconds, entries[1].delay_seconds);
        let expected = 0.0002 * 0.98 * 0.98 * 0.85;
        assert!((entries[0].delay_seconds - expected).abs() < 1e-12);
    }

    #[test]
    fn single_format_needs_no_selection() {
        let mut camera = Compliant::with_formats(&["OnlyOne"]);
        // An out-of-range index would normally error; with one format the
        // selection is implicit.
        let report = run(
            &mut camera,
            Selection::Index(7),
            no_settle(),
            &mut NullObserver,
        )
        .unwrap();
        assert_eq!(report.entries().len(), 1);
        assert_eq!(report.entries()[0].pixel_format, "OnlyOne");
    }

    #[test]
    fn index_selection_picks_one() {
        let mut camera = Compliant::with_formats(&["A", "B", "C"]);
        let report = run(
            &mut camera,
            Selection::Index(1),
            no_settle(),
            &mut NullObserver,
        )
        .unwrap();
        assert_eq!(report.entries().len(), 1);
        assert_eq!(report.entries()[0].pixel_format, "B");
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut camera = Compliant::with_formats(&["A", "B"]);
        let result = run(
            &mut camera,
            Selection::Index(2),
            no_settle(),
            &mut NullObserver,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_formats_never_enter_calibration() {
        let mut camera = Compliant::with_formats(&["A", "B"]);
        camera.formats.insert(
            1,
            PixelFormat {
                name: "Weird".into(),
                supported: false,
            },
        );
        let report = run(
            &mut camera,
            Selection::All,
            no_settle(),
            &mut NullObserver,
        )
        .unwrap();
        let names: Vec<&str> = report
            .entries()
            .iter()
            .map(|e| e.pixel_format.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn allocation_failure_skips_that_format_only() {
        let mut camera = Compliant::with_formats(&["A", "B"]);
        camera.refuse_allocation_for_format = Some(0);
        let report = run(
            &mut camera,
            Selection::All,
            no_settle(),
            &mut NullObserver,
        )
        .unwrap();
        assert_eq!(report.entries().len(), 1);
        assert_eq!(report.entries()[0].pixel_format, "B");
        // Every allocation that succeeded was released.
        assert_gt!(camera.allocations, 0);
        assert_eq!(camera.allocations, camera.releases);
    }

    #[test]
    fn zero_tick_frequency_aborts_the_whole_run() {
        struct NoClock(Compliant);
        impl DeviceAdapter for NoClock {
            fn identity(&self) -> Result<DeviceIdentity> {
                self.0.identity()
            }
            fn global_parameters(&self) -> Result<GlobalParameters> {
                self.0.global_parameters()
            }
            fn tick_frequency(&self) -> Result<u64> {
                Ok(0)
            }
            fn theoretical_delay_seconds(&self) -> Result<f64> {
                self.0.theoretical_delay_seconds()
            }
            fn enumerate_pixel_formats(&mut self) -> Result<Vec<PixelFormat>> {
                self.0.enumerate_pixel_formats()
            }
            fn pixel_format_writable(&self) -> Result<bool> {
                self.0.pixel_format_writable()
            }
            fn write_pixel_format(&mut self, name: &str) -> Result<()> {
                self.0.write_pixel_format(name)
            }
            fn allocate_buffers(&mut self, depth: usize) -> Result<BufferSet, AllocationError> {
                self.0.allocate_buffers(depth)
            }
            fn release_buffers(&mut self, buffers: BufferSet) {
                self.0.release_buffers(buffers);
            }
            fn set_packet_delay(&mut self, ticks: u64) -> Result<()> {
                self.0.set_packet_delay(ticks)
            }
            fn run_sampling_cycle(&mut self, buffers: &BufferSet) -> Result<f64> {
                self.0.run_sampling_cycle(buffers)
            }
        }

        let mut camera = NoClock(Compliant::with_formats(&["A"]));
        let result = run(
            &mut camera,
            Selection::All,
            no_settle(),
            &mut NullObserver,
        );
        assert!(result.is_err());
        // Nothing was partially executed.
        assert_eq!(camera.0.allocations, 0);
    }

    #[test]
    fn identical_runs_yield_identical_results() {
        let reports: Vec<_> = (0..2)
            .map(|_| {
                let mut camera = Compliant::with_formats(&["A", "B"]);
                run(
                    &mut camera,
                    Selection::All,
                    no_settle(),
                    &mut NullObserver,
                )
                .unwrap()
            })
            .collect();
        assert_eq!(reports[0].entries(), reports[1].entries());
    }

    #[test]
    fn delay_is_reset_after_the_batch() {
        let mut camera = Compliant::with_formats(&["A"]);
        let report = run(
            &mut camera,
            Selection::All,
            no_settle(),
            &mut NullObserver,
        )
        .unwrap();
        assert_gt!(report.entries()[0].delay_ticks, 0);
        assert_eq!(camera.delay_ticks, 0);
    }

    #[test]
    fn non_convergence_is_recorded_and_the_batch_continues() {
        /// Only ever reaches its reference rate with pacing fully disabled
        struct Stubborn(Compliant);
        impl DeviceAdapter for Stubborn {
            fn identity(&self) -> Result<DeviceIdentity> {
                self.0.identity()
            }
            fn global_parameters(&self) -> Result<GlobalParameters> {
                self.0.global_parameters()
            }
            fn tick_frequency(&self) -> Result<u64> {
                self.0.tick_frequency()
            }
            fn theoretical_delay_seconds(&self) -> Result<f64> {
                self.0.theoretical_delay_seconds()
            }
            fn enumerate_pixel_formats(&mut self) -> Result<Vec<PixelFormat>> {
                self.0.enumerate_pixel_formats()
            }
            fn pixel_format_writable(&self) -> Result<bool> {
                self.0.pixel_format_writable()
            }
            fn write_pixel_format(&mut self, name: &str) -> Result<()> {
                self.0.write_pixel_format(name)
            }
            fn allocate_buffers(&mut self, depth: usize) -> Result<BufferSet, AllocationError> {
                self.0.allocate_buffers(depth)
            }
            fn release_buffers(&mut self, buffers: BufferSet) {
                self.0.release_buffers(buffers);
            }
            fn set_packet_delay(&mut self, ticks: u64) -> Result<()> {
                self.0.set_packet_delay(ticks)
            }
            fn run_sampling_cycle(&mut self, _buffers: &BufferSet) -> Result<f64> {
                if self.0.delay_ticks == 0 {
                    Ok(25.0)
                } else {
                    Ok(15.0)
                }
            }
        }

        let mut camera = Stubborn(Compliant::with_formats(&["A", "B"]));
        let report = run(
            &mut camera,
            Selection::All,
            no_settle(),
            &mut NullObserver,
        )
        .unwrap();
        let entries = report.entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].succeeded);
        assert!(!entries[1].succeeded);
        // Store-on-success: a failed search reports no delay values.
        assert_eq!(entries[0].delay_ticks, 0);
        assert_eq!(entries[0].reference_rate, 0.0);
    }
}
