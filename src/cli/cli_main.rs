// Main CLI entrypoint
// (c) 2024 Ross Younger

use std::process::ExitCode;

use super::args::CliArgs;
use super::progress::SpinnerObserver;
use super::prompt::resolve_selection;

use crate::{
    calibrate,
    config::{Manager, Parameters},
    device::simulated::SimCamera,
    report,
    util::setup_tracing,
};
use clap::Parser;
use indicatif::MultiProgress;

/// Main CLI entrypoint
pub fn cli() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();
    if args.config_files {
        println!("{}", Manager::config_files().join("\n"));
        return Ok(ExitCode::SUCCESS);
    }

    let mut manager = Manager::new();
    manager.merge_provider(args.tuning);
    if args.show_config {
        println!("{manager}");
        return Ok(ExitCode::SUCCESS);
    }
    run(&args, &manager)
}

fn run(args: &CliArgs, manager: &Manager) -> anyhow::Result<ExitCode> {
    let progress = MultiProgress::new(); // This writes to stderr
    let trace_level = if args.debug {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };
    setup_tracing(trace_level, Some(&progress), &args.log_file)
        .inspect_err(|e| eprintln!("{e:?}"))?;

    let params: Parameters = manager
        .get()
        .inspect_err(|e| tracing::error!("reading configuration: {e}"))?;

    let mut camera = SimCamera::default();
    let selection = resolve_selection(args.format, &mut camera)?;

    let mut observer = SpinnerObserver::new(&progress, args.quiet);
    let outcome = calibrate::run(&mut camera, selection, params, &mut observer);
    observer.finish();
    progress.clear()?;

    match outcome {
        Ok(result) => {
            report::print(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
