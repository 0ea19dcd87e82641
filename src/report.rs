//! Human-friendly reporting of calibration outcomes
// (c) 2024 Ross Younger

use human_repr::HumanDuration as _;
use owo_colors::{OwoColorize as _, Stream};
use tabled::{settings::style::Style, Table, Tabled};

use crate::calibrate::{CalibrationResult, RunReport};

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Pixel format")]
    format: String,
    #[tabled(rename = "Delay (ticks)")]
    ticks: String,
    #[tabled(rename = "Delay")]
    delay: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Obtained")]
    obtained: String,
}

impl From<&CalibrationResult> for ReportRow {
    fn from(r: &CalibrationResult) -> Self {
        if r.succeeded {
            Self {
                format: r.pixel_format.clone(),
                ticks: r.delay_ticks.to_string(),
                delay: r.delay_seconds.human_duration().to_string(),
                reference: format!("{:.1} fps", r.reference_rate),
                obtained: format!("{:.1} fps", r.obtained_rate),
            }
        } else {
            Self {
                format: r.pixel_format.clone(),
                ticks: "-".into(),
                delay: "-".into(),
                reference: "-".into(),
                obtained: "no solution".into(),
            }
        }
    }
}

/// Prints the calibration summary to stdout.
///
/// The delays reported are only valid for the image parameters shown in the
/// header; recalibrate after changing resolution or packet size.
pub fn print(report: &RunReport) {
    use anstream::println;

    let globals = report.global_parameters();
    println!("Inter-packet delay report for {}:", report.identity());
    println!(
        "  Image size {}x{}, stream packet size {} bytes",
        globals.width, globals.height, globals.packet_size
    );
    let rows: Vec<ReportRow> = report.entries().iter().map(ReportRow::from).collect();
    println!("{}", Table::new(rows).with(Style::sharp()));

    let failures = report.entries().iter().filter(|e| !e.succeeded).count();
    if failures > 0 {
        println!(
            "{}: {failures} format(s) had no usable delay and are shown as \"no solution\"",
            "WARNING".if_supports_color(Stream::Stdout, |t| t.yellow())
        );
    }
    println!("Delays are valid for the image parameters above; recalibrate after changing them.");
}

#[cfg(test)]
mod tests {
    use super::ReportRow;
    use crate::calibrate::{CalibrationResult, CalibrationState};

    #[test]
    fn failure_renders_as_no_solution() {
        let row = ReportRow::from(&CalibrationResult::failure("Mono8"));
        assert_eq!(row.format, "Mono8");
        assert_eq!(row.ticks, "-");
        assert_eq!(row.obtained, "no solution");
    }

    #[test]
    fn success_renders_values() {
        let mut state = CalibrationState::new(1_000_000);
        state.reference_rate = 24.0;
        state.current_rate = 23.9;
        state.set_delay_seconds(0.0002);
        let row = ReportRow::from(&CalibrationResult::success("BayerRG8", &state));
        assert_eq!(row.format, "BayerRG8");
        assert_eq!(row.ticks, "200");
        assert_eq!(row.reference, "24.0 fps");
        assert_eq!(row.obtained, "23.9 fps");
    }
}
