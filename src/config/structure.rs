//! Configuration structure
// (c) 2024 Ross Younger

use std::time::Duration;

use clap::Parser;
use figment::{providers::Serialized, value::Dict, Metadata, Profile, Provider};
use serde::{Deserialize, Serialize};

use crate::device::ApplyPolicy;

/// The set of configurable options supported by ipcal.
///
/// **Note:** The implementation of `default()` for this struct returns the
/// hard-wired configuration defaults.
///
/// The CLI does not use this struct directly; it uses [`ParametersOverride`],
/// which is the same but with all members of type `Option<whatever>`.
/// The result is that wherever the user does not provide a value, values read
/// from lower priority sources (configuration files and system defaults)
/// obtain.
//
// Maintainer note: None of the members of this struct should be Option<anything>.
// That leads to sunspots in the CLI and strange warts (Some(Some(foo))).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Parameters {
    /// Number of acquisition buffers to allocate per pixel format
    pub buffer_depth: u16,
    /// Pause after each sampling cycle, letting the camera and its queues
    /// reach steady state, in milliseconds
    pub settle_ms: u16,
    /// Poll interval while waiting for the pixel format selector to become
    /// writable, in milliseconds
    pub apply_poll_ms: u16,
    /// Give up waiting for the selector after this many seconds.
    /// 0 means wait indefinitely.
    pub apply_timeout: u16,
}

impl Parameters {
    /// Accessor for `settle_ms`, as a Duration
    #[must_use]
    pub fn settle_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.settle_ms))
    }

    /// The pixel format application policy these parameters describe
    #[must_use]
    pub fn apply_policy(self) -> ApplyPolicy {
        ApplyPolicy {
            poll: Duration::from_millis(u64::from(self.apply_poll_ms)),
            timeout: match self.apply_timeout {
                0 => None,
                secs => Some(Duration::from_secs(u64::from(secs))),
            },
        }
    }
}

impl Default for Parameters {
    /// **(Unusual!)**
    /// Returns ipcal's hard-wired configuration defaults.
    fn default() -> Self {
        Self {
            buffer_depth: 20,
            settle_ms: 500,
            apply_poll_ms: 250,
            apply_timeout: 0,
        }
    }
}

/// The CLI face of [`Parameters`]: every field optional, defaulting to `None`.
///
/// Implements [`figment::Provider`], so it merges straight into the
/// [`Manager`](super::Manager) on top of the configuration files; fields the
/// user did not give are skipped during serialization and do not mask values
/// from lower priority sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Parser, Deserialize, Serialize)]
pub struct ParametersOverride {
    /// Number of acquisition buffers to allocate per pixel format
    /// [default: 20]
    #[arg(long, help_heading("Calibration tuning"), value_name("N"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_depth: Option<u16>,

    /// Pause after each sampling cycle before acting on the measurement,
    /// in milliseconds [default: 500]
    ///
    /// Cameras with deep internal queues may need longer to reach steady
    /// state after a delay change.
    #[arg(long, help_heading("Calibration tuning"), value_name("ms"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u16>,

    /// Poll interval while waiting for the pixel format selector to become
    /// writable, in milliseconds [default: 250]
    #[arg(long, help_heading("Calibration tuning"), value_name("ms"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_poll_ms: Option<u16>,

    /// Give up waiting for the pixel format selector after this many seconds.
    /// [default: 0, meaning wait indefinitely]
    #[arg(long, help_heading("Calibration tuning"), value_name("sec"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_timeout: Option<u16>,
}

impl Provider for ParametersOverride {
    fn metadata(&self) -> Metadata {
        Metadata::named("command line")
    }

    fn data(&self) -> Result<figment::value::Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}
