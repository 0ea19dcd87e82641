//! Configuration management
// (c) 2024 Ross Younger
//!
//! ipcal obtains run-time configuration from the following sources, in order:
//! 1. Command-line options
//! 2. The user's configuration file (typically `~/.ipcal.toml`)
//! 3. The system-wide configuration file (typically `/etc/ipcal.toml`)
//! 4. Hard-wired defaults
//!
//! Options specified in a higher-priority source override those from lower
//! priority sources. To see what is in effect after merging, run
//! `ipcal --show-config`; to see which files are consulted,
//! `ipcal --config-files`.
//!
//! ## File format
//!
//! Configuration files are in [TOML](https://toml.io/) format, one key per
//! line, matching the field names of [`Parameters`]:
//!
//! ```toml
//! buffer_depth = 20
//! settle_ms = 500
//! ```

mod structure;
pub use structure::{Parameters, ParametersOverride};

mod manager;
pub use manager::Manager;
