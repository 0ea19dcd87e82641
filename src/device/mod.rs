//! Camera abstraction layer
// (c) 2024 Ross Younger
//!
//! The calibration core drives a camera exclusively through the
//! [`DeviceAdapter`] trait. Production deployments implement it against
//! their acquisition SDK; [`simulated::SimCamera`] is a deterministic
//! software implementation used by the CLI and the test suite.

use std::{fmt::Display, time::Duration};

use anyhow::Result;

pub mod simulated;

/// Camera identity, as reported by the device
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    /// Manufacturer name
    pub vendor: String,
    /// Model name
    pub model: String,
}

impl Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.vendor, self.model)
    }
}

/// Acquisition parameters that hold for the whole run, not per pixel format
#[derive(Debug, Clone, Copy)]
pub struct GlobalParameters {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Negotiated stream packet size in bytes
    pub packet_size: u32,
}

/// A pixel format as enumerated from the camera
#[derive(Debug, Clone)]
pub struct PixelFormat {
    /// Format name, e.g. `Mono8`
    pub name: String,
    /// Whether the host can actually acquire in this format.
    /// Unsupported formats never enter calibration.
    pub supported: bool,
}

/// Opaque handle to a set of allocated acquisition buffers.
///
/// Exactly one set exists at a time; it must be handed back via
/// [`DeviceAdapter::release_buffers`] before the next set is allocated.
// Deliberately not Copy: the handle is a token of ownership.
#[allow(missing_copy_implementations)]
#[derive(Debug)]
pub struct BufferSet {
    depth: usize,
}

impl BufferSet {
    /// Constructor, for use by adapter implementations
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    /// The number of buffers in the set
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// A buffer allocation failure.
///
/// This is fatal to the calibration of one pixel format only;
/// the batch carries on with the next.
#[derive(Debug)]
pub struct AllocationError(pub String);

impl Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buffer allocation failed: {}", self.0)
    }
}

impl std::error::Error for AllocationError {}

/// How long to wait for the camera's pixel format selector to become writable
#[derive(Debug, Clone, Copy)]
pub struct ApplyPolicy {
    /// Poll interval
    pub poll: Duration,
    /// Give up after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for ApplyPolicy {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(250),
            timeout: None,
        }
    }
}

/// Capability contract consumed by the calibration core.
///
/// Sampling is exposed as a synchronous, blocking call: however the
/// underlying acquisition engine works, [`DeviceAdapter::run_sampling_cycle`]
/// returns only once its bounded sampling window has completed.
pub trait DeviceAdapter {
    /// Vendor/model identity
    fn identity(&self) -> Result<DeviceIdentity>;
    /// Width, height and packet size currently in force
    fn global_parameters(&self) -> Result<GlobalParameters>;
    /// Device clock ticks per second. Zero means the camera cannot
    /// express an inter-packet delay at all.
    fn tick_frequency(&self) -> Result<u64>;
    /// The camera's own suggested inter-packet delay for the current
    /// parameters, in seconds. Used to seed the search.
    fn theoretical_delay_seconds(&self) -> Result<f64>;

    /// Lists the camera's pixel formats in enumeration order
    fn enumerate_pixel_formats(&mut self) -> Result<Vec<PixelFormat>>;
    /// Whether the pixel format selector can be written right now
    fn pixel_format_writable(&self) -> Result<bool>;
    /// Writes the pixel format selector. Callers normally go through
    /// [`DeviceAdapter::apply_pixel_format`] instead.
    fn write_pixel_format(&mut self, name: &str) -> Result<()>;

    /// Allocates acquisition buffers sized for the current pixel format
    fn allocate_buffers(&mut self, depth: usize) -> Result<BufferSet, AllocationError>;
    /// Returns a buffer set to the device
    fn release_buffers(&mut self, buffers: BufferSet);

    /// Programs the inter-packet delay, in device clock ticks
    fn set_packet_delay(&mut self, ticks: u64) -> Result<()>;
    /// Runs one bounded sampling cycle and returns the achieved frame rate.
    /// Blocks until the cycle completes.
    fn run_sampling_cycle(&mut self, buffers: &BufferSet) -> Result<f64>;

    /// Applies a pixel format, first waiting for the selector to become
    /// writable. Polls at the policy's interval; if a timeout is configured
    /// and expires, surfaces an error rather than waiting forever.
    fn apply_pixel_format(&mut self, name: &str, policy: ApplyPolicy) -> Result<()> {
        let mut waited = Duration::ZERO;
        while !self.pixel_format_writable()? {
            if let Some(limit) = policy.timeout {
                if waited >= limit {
                    anyhow::bail!(
                        "timed out waiting for the pixel format selector to become writable"
                    );
                }
            }
            std::thread::sleep(policy.poll);
            waited += policy.poll;
        }
        self.write_pixel_format(name)
    }
}
