//! Inter-packet delay calibration for GigE Vision cameras
// (c) 2024 Ross Younger
//!
//! A `GigE Vision` camera paces its stream by inserting a delay between
//! packets, measured in ticks of its internal clock. Too little delay and a
//! busy network segment drops packets; too much and the camera cannot sustain
//! its frame rate. This crate searches for the largest delay that still
//! sustains the camera's unpaced frame rate, per pixel format, and reports
//! the findings.
//!
//! The binary (`ipcal`) drives the search against a deterministic simulated
//! camera. Library users supply their own
//! [`DeviceAdapter`](device::DeviceAdapter) implementation and call
//! [`calibrate::run`].

/// Calibration engine
pub mod calibrate;
mod cli;
pub use cli::cli;
/// Configuration management
pub mod config;
/// Camera abstraction layer
pub mod device;
/// Outcome reporting
pub mod report;
/// Utilities
pub mod util;
