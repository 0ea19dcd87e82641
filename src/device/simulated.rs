//! Simulated `GigE Vision` camera
// (c) 2024 Ross Younger
//!
//! A deterministic software model of a gigabit-ethernet camera, good enough
//! to exercise the calibration loop without acquisition hardware. Each frame
//! leaves the camera as a train of stream packets; inserting a per-packet
//! delay stretches the frame's transmission time. While transmission still
//! fits inside the sensor's frame period the achieved rate is unaffected,
//! which is precisely the plateau the delay search walks along.

use anyhow::Result;
use tracing::trace;

use super::{
    AllocationError, BufferSet, DeviceAdapter, DeviceIdentity, GlobalParameters, PixelFormat,
};

/// Ethernet + IP + UDP + stream protocol headers, per packet
const PACKET_OVERHEAD: u32 = 36;

/// Cameras overstate their suggested delay; the search walks it back.
const SEED_OVERSHOOT: f64 = 1.25;

/// One pixel format of the simulated camera
#[derive(Debug, Clone)]
pub struct SimFormat {
    /// Format name, e.g. `Mono8`
    pub name: String,
    /// Whether host buffers can represent this format
    pub supported: bool,
    /// Bytes per pixel on the wire
    pub bytes_per_pixel: u32,
}

impl SimFormat {
    fn new(name: &str, supported: bool, bytes_per_pixel: u32) -> Self {
        Self {
            name: name.into(),
            supported,
            bytes_per_pixel,
        }
    }
}

/// A deterministic, software-only `GigE Vision` camera
#[derive(Debug, Clone)]
pub struct SimCamera {
    width: u32,
    height: u32,
    packet_size: u32,
    link_bits_per_sec: f64,
    /// Native sensor frame rate; the wire may not be able to keep up with it
    sensor_rate: f64,
    tick_frequency: u64,
    formats: Vec<SimFormat>,
    current_format: usize,
    delay_ticks: u64,
    buffers_allocated: bool,
}

impl Default for SimCamera {
    fn default() -> Self {
        Self {
            width: 1936,
            height: 1216,
            packet_size: 1500,
            link_bits_per_sec: 1e9,
            sensor_rate: 24.0,
            tick_frequency: 125_000_000, // 8ns ticks
            formats: vec![
                SimFormat::new("Mono8", true, 1),
                SimFormat::new("BayerRG8", true, 1),
                SimFormat::new("YUV422_8", true, 2),
                SimFormat::new("RGB8", true, 3),
                // Packed 12-bit has no host buffer representation here
                SimFormat::new("Mono12p", false, 2),
            ],
            current_format: 0,
            delay_ticks: 0,
            buffers_allocated: false,
        }
    }
}

impl SimCamera {
    /// Creates a camera with a specific tick frequency (zero models a camera
    /// with no inter-packet delay support at all).
    #[must_use]
    pub fn with_tick_frequency(tick_frequency: u64) -> Self {
        Self {
            tick_frequency,
            ..Self::default()
        }
    }

    fn current(&self) -> &SimFormat {
        &self.formats[self.current_format]
    }

    fn packets_per_frame(&self, format: &SimFormat) -> f64 {
        let payload = f64::from(self.packet_size - PACKET_OVERHEAD);
        let image_bytes =
            f64::from(self.width) * f64::from(self.height) * f64::from(format.bytes_per_pixel);
        (image_bytes / payload).ceil()
    }

    fn packet_time(&self) -> f64 {
        f64::from(self.packet_size) * 8.0 / self.link_bits_per_sec
    }

    fn transmit_time(&self, format: &SimFormat) -> f64 {
        self.packets_per_frame(format) * self.packet_time()
    }

    /// Achieved frame rate for a given per-packet delay.
    /// Cameras report rates with limited precision; quantise to 0.01 fps.
    fn rate_with_delay(&self, format: &SimFormat, delay_seconds: f64) -> f64 {
        let per_frame = self.packets_per_frame(format) * (self.packet_time() + delay_seconds);
        let rate = (1.0 / per_frame).min(self.sensor_rate);
        (rate * 100.0).round() / 100.0
    }
}

impl DeviceAdapter for SimCamera {
    fn identity(&self) -> Result<DeviceIdentity> {
        Ok(DeviceIdentity {
            vendor: "Simulated".into(),
            model: "SIM-GV2000".into(),
        })
    }

    fn global_parameters(&self) -> Result<GlobalParameters> {
        Ok(GlobalParameters {
            width: self.width,
            height: self.height,
            packet_size: self.packet_size,
        })
    }

    fn tick_frequency(&self) -> Result<u64> {
        Ok(self.tick_frequency)
    }

    fn theoretical_delay_seconds(&self) -> Result<f64> {
        let format = self.current();
        let period = 1.0 / self.sensor_rate;
        // Idle time between frames, spread over the frame's packets.
        let headroom = (period - self.transmit_time(format)).max(0.0);
        Ok(headroom / self.packets_per_frame(format) * SEED_OVERSHOOT)
    }

    fn enumerate_pixel_formats(&mut self) -> Result<Vec<PixelFormat>> {
        Ok(self
            .formats
            .iter()
            .map(|f| PixelFormat {
                name: f.name.clone(),
                supported: f.supported,
            })
            .collect())
    }

    fn pixel_format_writable(&self) -> Result<bool> {
        // The selector locks while acquisition buffers are outstanding.
        Ok(!self.buffers_allocated)
    }

    fn write_pixel_format(&mut self, name: &str) -> Result<()> {
        let index = self
            .formats
            .iter()
            .position(|f| f.name == name && f.supported)
            .ok_or_else(|| anyhow::anyhow!("unknown or unsupported pixel format {name}"))?;
        self.current_format = index;
        trace!("pixel format now {name}");
        Ok(())
    }

    fn allocate_buffers(&mut self, depth: usize) -> Result<BufferSet, AllocationError> {
        if self.buffers_allocated {
            return Err(AllocationError("previous buffer set still held".into()));
        }
        self.buffers_allocated = true;
        Ok(BufferSet::new(depth))
    }

    fn release_buffers(&mut self, buffers: BufferSet) {
        drop(buffers);
        self.buffers_allocated = false;
    }

    fn set_packet_delay(&mut self, ticks: u64) -> Result<()> {
        self.delay_ticks = ticks;
        trace!("inter-packet delay now {ticks} ticks");
        Ok(())
    }

    fn run_sampling_cycle(&mut self, buffers: &BufferSet) -> Result<f64> {
        #[allow(clippy::cast_precision_loss)]
        let delay_seconds = self.delay_ticks as f64 / self.tick_frequency as f64;
        let rate = self.rate_with_delay(self.current(), delay_seconds);
        trace!(
            "sampled {} frames at {rate:.2} fps ({} ticks delay)",
            buffers.depth(),
            self.delay_ticks
        );
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceAdapter as _, SimCamera};
    use assertables::{assert_gt, assert_lt};

    #[test]
    #[allow(clippy::float_cmp)]
    fn rate_plateau_below_headroom() {
        let mut camera = SimCamera::default();
        let buffers = camera.allocate_buffers(20).unwrap();
        let unpaced = camera.run_sampling_cycle(&buffers).unwrap();

        // A small delay leaves transmission inside the frame period.
        camera.set_packet_delay(100).unwrap();
        assert_eq!(camera.run_sampling_cycle(&buffers).unwrap(), unpaced);

        // An enormous one does not.
        camera.set_packet_delay(50_000).unwrap();
        assert_lt!(camera.run_sampling_cycle(&buffers).unwrap(), unpaced);
        camera.release_buffers(buffers);
    }

    #[test]
    fn theoretical_delay_is_nonzero_with_headroom() {
        let camera = SimCamera::default(); // Mono8 selected
        assert_gt!(camera.theoretical_delay_seconds().unwrap(), 0.0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn wire_limited_format_suggests_zero() {
        let mut camera = SimCamera::default();
        camera.write_pixel_format("RGB8").unwrap();
        // RGB8 saturates the gigabit link; there is no idle time to spread.
        assert_eq!(camera.theoretical_delay_seconds().unwrap(), 0.0);
    }

    #[test]
    fn exclusive_buffer_ownership() {
        let mut camera = SimCamera::default();
        let first = camera.allocate_buffers(20).unwrap();
        assert!(camera.allocate_buffers(20).is_err());
        camera.release_buffers(first);
        let second = camera.allocate_buffers(20).unwrap();
        camera.release_buffers(second);
    }

    #[test]
    fn selector_locked_while_acquiring() {
        let mut camera = SimCamera::default();
        assert!(camera.pixel_format_writable().unwrap());
        let buffers = camera.allocate_buffers(20).unwrap();
        assert!(!camera.pixel_format_writable().unwrap());
        camera.release_buffers(buffers);
        assert!(camera.pixel_format_writable().unwrap());
    }
}
