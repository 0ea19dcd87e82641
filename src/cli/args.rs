// ipcal top-level command-line arguments
// (c) 2024 Ross Younger

use crate::{config::ParametersOverride, util::Selection};
use clap::Parser;

/// Options that switch us into another mode i.e. which don't run a calibration
const MODE_OPTIONS: &[&str] = &["show_config", "config_files"];

#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version(env!("IPCAL_VERSION_STRING")),
    about,
    before_help = "e.g.   ipcal --format all",
    infer_long_args(true)
)]
#[command(help_template(
    "\
{name} version {version}
{about-with-newline}
{usage-heading} {usage}
{before-help}
{all-args}{after-help}
"
))]
#[command(styles=super::styles::CLAP_STYLES)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CliArgs {
    // MODE SELECTION ======================================================================
    /// Outputs the merged configuration currently in effect, then exits
    #[arg(long, help_heading("Modes"), conflicts_with("config_files"))]
    pub show_config: bool,

    /// Outputs the list of configuration files we read, then exits
    #[arg(long, help_heading("Modes"))]
    pub config_files: bool,

    // CALIBRATION OPTIONS =================================================================
    /// Quiet mode
    ///
    /// Switches off progress display; reports only errors and the final summary
    #[arg(short, long, action, conflicts_with("debug"))]
    pub quiet: bool,

    /// Which pixel format(s) to calibrate: `all`, or the index of a single
    /// format as listed by the interactive prompt.
    ///
    /// If unspecified and the camera offers more than one supported format,
    /// you are prompted to choose (when running interactively).
    #[arg(
        short,
        long,
        value_name("N|all"),
        conflicts_with_all(MODE_OPTIONS)
    )]
    pub format: Option<Selection>,

    // DEBUG -------------------------------------------------------------------------------
    /// Enable detailed debug output
    ///
    /// This has the same effect as setting `RUST_LOG=ipcal=debug` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, help_heading("Debug"))]
    pub debug: bool,

    /// Log to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(short('l'), long, action, help_heading("Debug"), value_name("FILE"))]
    pub log_file: Option<String>,

    // TUNING ==============================================================================
    #[command(flatten)]
    pub tuning: ParametersOverride,
}
