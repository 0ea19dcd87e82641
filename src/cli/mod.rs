/// Command Line Interface for ipcal
/// (c) 2024 Ross Younger
mod args;
mod cli_main;
mod progress;
mod prompt;
pub(crate) mod styles;
pub use cli_main::cli;
