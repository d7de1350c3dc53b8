use std::time::Duration;

use crate::{Error, Result};
use crate::config::{AcquisitionParameters, CaptureConfiguration, SampleMode, Timing};
use crate::sys::{DeviceStatus, Driver};

const TASK_NAME: &str = "capture";

/// Ordered wrapper over the raw driver calls.
///
/// Decorates every nonzero driver status with the name of the failing
/// operation and the driver's extended error text, and tracks whether a task
/// exists so teardown can be issued unconditionally on any exit path.
#[derive(Debug)]
pub struct Device<D: Driver> {
    driver: D,
    task_created: bool,
}

#[cfg(feature = "simulator")]
impl Device<crate::sys::imp::SimulatedDriverImpl> {
    /// Open a device backed by the in-process simulator.
    pub fn new() -> Result<Device<crate::sys::imp::SimulatedDriverImpl>> {
        Ok(Device::from_driver(crate::sys::imp::SimulatedDriverImpl::new()))
    }
}

impl<D: Driver> Device<D> {
    pub fn from_driver(driver: D) -> Device<D> {
        Device { driver, task_created: false }
    }

    fn check<T>(&mut self, operation: &'static str,
                result: core::result::Result<T, DeviceStatus>) -> Result<T> {
        result.map_err(|status| {
            let detail = self.driver.extended_error_info();
            Error::Device { operation, status: status.0, detail }
        })
    }

    /// Run the full configuration sequence: device reset, task creation,
    /// channel, timing and input buffer setup, in driver order.
    pub fn configure(&mut self, config: &CaptureConfiguration,
                     parameters: &AcquisitionParameters) -> Result<()> {
        log::debug!("reset()");
        let result = self.driver.reset();
        self.check("reset", result)?;

        log::debug!("create_task({:?})", TASK_NAME);
        let result = self.driver.create_task(TASK_NAME);
        self.check("create_task", result)?;
        self.task_created = true;

        log::debug!("configure_channels({}, {:?}, {:?})",
            config.channels, config.input_mode, config.voltage_range);
        let result = self.driver.configure_channels(&config.channels,
            config.input_mode, config.voltage_range);
        self.check("configure_channels", result)?;

        let timing = Timing {
            clock_source: config.clock_source,
            sample_rate: parameters.sample_rate(),
            edge: config.edge,
            mode: SampleMode::Finite,
            sample_count: parameters.target_sample_count(),
        };
        log::debug!("configure_timing({:?})", timing);
        let result = self.driver.configure_timing(&timing);
        self.check("configure_timing", result)?;

        log::debug!("configure_input_buffer({})", config.input_buffer_rows);
        let result = self.driver.configure_input_buffer(config.input_buffer_rows);
        self.check("configure_input_buffer", result)
    }

    pub fn start(&mut self) -> Result<()> {
        log::debug!("start()");
        let result = self.driver.start();
        self.check("start", result)
    }

    pub fn read_batch(&mut self, data: &mut [f64], capacity_rows: usize,
                      timeout: Duration) -> Result<usize> {
        let result = self.driver.read_batch(data, capacity_rows, timeout);
        let rows = self.check("read_batch", result)?;
        log::trace!("read_batch({}) = {}", capacity_rows, rows);
        Ok(rows)
    }

    /// Stop and clear the task. A no-op if no task was ever created. Clear
    /// is attempted even if stop fails; the first failure wins.
    pub fn teardown(&mut self) -> Result<()> {
        if !self.task_created {
            return Ok(());
        }
        log::debug!("stop()");
        let result = self.driver.stop();
        let stopped = self.check("stop", result);
        log::debug!("clear()");
        let result = self.driver.clear();
        let cleared = self.check("clear", result);
        self.task_created = false;
        stopped.and(cleared)
    }
}
