//! Results aggregation
// (c) 2024 Ross Younger

use super::types::CalibrationResult;
use crate::device::{DeviceIdentity, GlobalParameters};

/// Everything a reporting surface needs: camera identity, the run-wide
/// acquisition parameters, and one outcome per calibrated pixel format in
/// processing order.
///
/// Pure collection; performs no computation of its own.
#[derive(Debug)]
pub struct RunReport {
    identity: DeviceIdentity,
    globals: GlobalParameters,
    entries: Vec<CalibrationResult>,
}

impl RunReport {
    pub(crate) fn new(identity: DeviceIdentity, globals: GlobalParameters) -> Self {
        Self {
            identity,
            globals,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, result: CalibrationResult) {
        self.entries.push(result);
    }

    /// Camera vendor/model
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Width, height and packet size, queried once for the run
    #[must_use]
    pub fn global_parameters(&self) -> GlobalParameters {
        self.globals
    }

    /// Outcomes in the order the formats were processed
    #[must_use]
    pub fn entries(&self) -> &[CalibrationResult] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::RunReport;
    use crate::calibrate::types::CalibrationResult;
    use crate::device::{DeviceIdentity, GlobalParameters};

    #[test]
    fn preserves_insertion_order() {
        let mut report = RunReport::new(
            DeviceIdentity {
                vendor: "v".into(),
                model: "m".into(),
            },
            GlobalParameters {
                width: 1,
                height: 1,
                packet_size: 1500,
            },
        );
        for name in ["C", "A", "B"] {
            report.push(CalibrationResult::failure(name));
        }
        let names: Vec<&str> = report
            .entries()
            .iter()
            .map(|e| e.pixel_format.as_str())
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }
}
