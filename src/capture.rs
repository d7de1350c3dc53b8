//! Bounded streaming acquisition: the session loop, its state machine, and
//! the output timebase.

use std::io::Write;
use std::time::Duration;

use crate::Result;
use crate::config::{AcquisitionParameters, CaptureConfiguration};
use crate::device::Device;
use crate::emit;
use crate::stats::Aggregator;
use crate::sys::Driver;

/// Rows per channel requested from the driver in one read, independent of
/// the target sample count.
const BATCH_CAPACITY_ROWS: usize = 1000;
/// Upper bound on how long a single read may block.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Monotonic output timestamps: `index * step`, starting at one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timebase {
    step: f64,
    index: u64,
}

impl Timebase {
    pub fn new(step: f64) -> Timebase {
        Timebase { step, index: 0 }
    }

    /// Timestamp for the next row. Multiplies the row index rather than
    /// accumulating, so the sequence carries no rounding drift.
    pub fn next(&mut self) -> f64 {
        self.index += 1;
        self.index as f64 * self.step
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Running,
    Completed,
    Failed,
}

/// One bounded capture: drives the device until the target sample count is
/// met, feeding every row to the aggregator, the timebase and the sink.
pub struct CaptureSession<D: Driver> {
    device: Device<D>,
    config: CaptureConfiguration,
    parameters: AcquisitionParameters,
    statistics: Aggregator,
    timebase: Timebase,
    total_rows: u64,
    state: SessionState,
}

impl<D: Driver> CaptureSession<D> {
    pub fn new(device: Device<D>, config: CaptureConfiguration,
               parameters: AcquisitionParameters) -> CaptureSession<D> {
        debug_assert_eq!(config.channels.count as usize, parameters.channel_count());
        CaptureSession {
            device,
            config,
            parameters,
            statistics: Aggregator::new(parameters.channel_count()),
            timebase: Timebase::new(parameters.timestep()),
            total_rows: 0,
            state: SessionState::Unconfigured,
        }
    }

    /// Total rows read so far across all batches.
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn statistics(&self) -> &Aggregator {
        &self.statistics
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the capture to completion, writing one line per row to `sink`.
    ///
    /// The device is torn down on every exit path; if the task was never
    /// created the teardown is a no-op. An error from any driver call, or
    /// from the sink, aborts the run immediately. Returns the total number
    /// of rows read, which may exceed the target if the last batch
    /// overshoots it.
    pub fn run(&mut self, sink: &mut impl Write) -> Result<u64> {
        match self.acquire(sink) {
            Ok(()) => match self.device.teardown() {
                Ok(()) => {
                    self.state = SessionState::Completed;
                    Ok(self.total_rows)
                }
                Err(error) => {
                    self.state = SessionState::Failed;
                    Err(error)
                }
            },
            Err(error) => {
                self.state = SessionState::Failed;
                // keep the primary error; a teardown failure here is only reported
                if let Err(teardown_error) = self.device.teardown() {
                    log::warn!("teardown failed after error: {}", teardown_error);
                }
                Err(error)
            }
        }
    }

    fn acquire(&mut self, sink: &mut impl Write) -> Result<()> {
        debug_assert_eq!(self.state, SessionState::Unconfigured);
        let target = self.parameters.target_sample_count();
        let channels = self.parameters.channel_count();

        log::info!("configuring device");
        self.device.configure(&self.config, &self.parameters)?;
        self.state = SessionState::Configured;

        log::info!("starting acquisition of {} rows", target);
        self.device.start()?;
        self.state = SessionState::Running;

        let mut data = vec![0.0; BATCH_CAPACITY_ROWS * channels];
        while self.total_rows < target {
            let rows = self.device.read_batch(&mut data, BATCH_CAPACITY_ROWS, READ_TIMEOUT)?;
            if rows == 0 {
                continue; // timed out with no data; ask again
            }
            self.total_rows += rows as u64;
            log::debug!("acquired {} rows, {} total", rows, self.total_rows);
            for row in data[..rows * channels].chunks_exact(channels) {
                let timestamp = self.timebase.next();
                for (channel, &value) in row.iter().enumerate() {
                    self.statistics.update(channel, value);
                }
                emit::write_row(sink, timestamp, row)?;
            }
        }
        log::info!("acquired {} total rows", self.total_rows);
        Ok(())
    }
}
