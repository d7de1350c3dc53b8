use std::time::Duration;

use crate::config::{ChannelSpec, InputMode, Timing, VoltageRange};

/// Raw nonzero status code returned by a failed driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus(pub i32);

/// Contract the acquisition core requires from a hardware backend.
///
/// The calls mirror the task lifecycle of multifunction DAQ driver stacks:
/// device reset, task creation, channel/timing/buffer configuration, start,
/// bounded interleaved reads, stop, clear. Any `Err` status is fatal to the
/// session that issued the call; `extended_error_info` is queried exactly
/// once right after, so implementations keep the detail of the most recent
/// failure around.
pub trait Driver {
    fn reset(&mut self) -> Result<(), DeviceStatus>;
    fn create_task(&mut self, name: &str) -> Result<(), DeviceStatus>;
    fn configure_channels(&mut self, channels: &ChannelSpec, input_mode: InputMode,
                          range: VoltageRange) -> Result<(), DeviceStatus>;
    fn configure_timing(&mut self, timing: &Timing) -> Result<(), DeviceStatus>;
    fn configure_input_buffer(&mut self, capacity_rows: usize) -> Result<(), DeviceStatus>;
    fn start(&mut self) -> Result<(), DeviceStatus>;

    /// Read up to `capacity_rows` interleaved rows into `data`, blocking for
    /// at most `timeout`. `data` must hold `capacity_rows` times the
    /// configured channel count. Returns the number of rows delivered;
    /// 0 means no data arrived within the timeout, which is not an error.
    fn read_batch(&mut self, data: &mut [f64], capacity_rows: usize, timeout: Duration)
        -> Result<usize, DeviceStatus>;

    fn stop(&mut self) -> Result<(), DeviceStatus>;
    fn clear(&mut self) -> Result<(), DeviceStatus>;

    /// Human-readable detail for the most recent failing call.
    fn extended_error_info(&mut self) -> String;
}

#[cfg(feature = "simulator")]
#[path = "sim.rs"]
pub mod imp;
