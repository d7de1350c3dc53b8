//! In-process simulated backend: paces zero-centered noise against the wall
//! clock so the whole stack can run without hardware attached.

use std::thread::sleep;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ChannelSpec, InputMode, SampleMode, Timing, VoltageRange};
use crate::sys::{DeviceStatus, Driver};

const STATUS_NO_TASK: i32 = -10;
const STATUS_NOT_CONFIGURED: i32 = -11;
const STATUS_NOT_STARTED: i32 = -12;
const STATUS_BUFFER_OVERFLOW: i32 = -20;

const DEFAULT_BUFFER_ROWS: usize = 100000;

#[derive(Debug)]
struct Task {
    channel_count: usize,
    amplitude: f64,
    timing: Option<Timing>,
    buffer_rows: usize,
    started_at: Option<Instant>,
    consumed: u64,
}

#[derive(Debug)]
pub struct SimulatedDriverImpl {
    rng: StdRng,
    task: Option<Task>,
    last_error: String,
}

impl SimulatedDriverImpl {
    pub fn new() -> SimulatedDriverImpl {
        SimulatedDriverImpl {
            rng: StdRng::from_entropy(),
            task: None,
            last_error: String::new(),
        }
    }

    fn task_mut(&mut self) -> Result<&mut Task, DeviceStatus> {
        match self.task {
            Some(ref mut task) => Ok(task),
            None => {
                self.last_error = "no task has been created".to_owned();
                Err(DeviceStatus(STATUS_NO_TASK))
            }
        }
    }
}

impl Driver for SimulatedDriverImpl {
    fn reset(&mut self) -> Result<(), DeviceStatus> {
        // aborts and releases whatever task existed
        self.task = None;
        Ok(())
    }

    fn create_task(&mut self, name: &str) -> Result<(), DeviceStatus> {
        log::debug!("simulator: created task {:?}", name);
        self.task = Some(Task {
            channel_count: 0,
            amplitude: 0.0,
            timing: None,
            buffer_rows: DEFAULT_BUFFER_ROWS,
            started_at: None,
            consumed: 0,
        });
        Ok(())
    }

    fn configure_channels(&mut self, channels: &ChannelSpec, _input_mode: InputMode,
                          range: VoltageRange) -> Result<(), DeviceStatus> {
        let task = self.task_mut()?;
        task.channel_count = channels.count as usize;
        // noise stays well inside the configured range
        task.amplitude = 0.25 * range.half_scale();
        Ok(())
    }

    fn configure_timing(&mut self, timing: &Timing) -> Result<(), DeviceStatus> {
        let task = self.task_mut()?;
        task.timing = Some(*timing);
        Ok(())
    }

    fn configure_input_buffer(&mut self, capacity_rows: usize) -> Result<(), DeviceStatus> {
        let task = self.task_mut()?;
        task.buffer_rows = capacity_rows;
        Ok(())
    }

    fn start(&mut self) -> Result<(), DeviceStatus> {
        let task = self.task_mut()?;
        if task.timing.is_none() || task.channel_count == 0 {
            self.last_error = "start issued before channel and timing configuration".to_owned();
            return Err(DeviceStatus(STATUS_NOT_CONFIGURED));
        }
        task.started_at = Some(Instant::now());
        task.consumed = 0;
        Ok(())
    }

    fn read_batch(&mut self, data: &mut [f64], capacity_rows: usize, timeout: Duration)
            -> Result<usize, DeviceStatus> {
        let deadline = Instant::now() + timeout;
        let (started_at, timing, channel_count, amplitude, buffer_rows, consumed) = {
            let task = match self.task {
                Some(ref task) => task,
                None => {
                    self.last_error = "no task has been created".to_owned();
                    return Err(DeviceStatus(STATUS_NO_TASK));
                }
            };
            let started_at = match task.started_at {
                Some(instant) => instant,
                None => {
                    self.last_error = "read issued before the task was started".to_owned();
                    return Err(DeviceStatus(STATUS_NOT_STARTED));
                }
            };
            // start() refuses to run without timing, so a started task has it
            let timing = match task.timing {
                Some(timing) => timing,
                None => {
                    self.last_error = "task has no timing configuration".to_owned();
                    return Err(DeviceStatus(STATUS_NOT_CONFIGURED));
                }
            };
            (started_at, timing, task.channel_count, task.amplitude,
             task.buffer_rows, task.consumed)
        };

        let period = Duration::from_secs_f64(1.0 / timing.sample_rate);
        loop {
            let elapsed = started_at.elapsed().as_secs_f64();
            let mut produced = (elapsed * timing.sample_rate) as u64;
            if let SampleMode::Finite = timing.mode {
                produced = produced.min(timing.sample_count);
            }
            let pending = produced - consumed;
            if pending > buffer_rows as u64 {
                self.last_error = format!(
                    "input buffer overflow: {} rows pending, capacity {}", pending, buffer_rows);
                return Err(DeviceStatus(STATUS_BUFFER_OVERFLOW));
            }
            if pending > 0 {
                let rows = (pending as usize).min(capacity_rows);
                for value in data[..rows * channel_count].iter_mut() {
                    *value = self.rng.gen_range(-amplitude..=amplitude);
                }
                if let Some(ref mut task) = self.task {
                    task.consumed += rows as u64;
                }
                return Ok(rows);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(0);
            }
            // wait for the next sample to come due, or for the deadline
            sleep(period.min(deadline.saturating_duration_since(now)));
        }
    }

    fn stop(&mut self) -> Result<(), DeviceStatus> {
        let task = self.task_mut()?;
        task.started_at = None;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DeviceStatus> {
        match self.task.take() {
            Some(_) => Ok(()),
            None => {
                self.last_error = "no task has been created".to_owned();
                Err(DeviceStatus(STATUS_NO_TASK))
            }
        }
    }

    fn extended_error_info(&mut self) -> String {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod test {
    use crate::config::{ClockSource, Edge};

    use super::*;

    fn configured(sample_rate: f64, sample_count: u64, channels: u32) -> SimulatedDriverImpl {
        let mut driver = SimulatedDriverImpl::new();
        driver.reset().unwrap();
        driver.create_task("test").unwrap();
        let spec = ChannelSpec { device: "Dev1".to_owned(), first: 0, count: channels };
        driver.configure_channels(&spec, InputMode::Differential,
            VoltageRange::default()).unwrap();
        driver.configure_timing(&Timing {
            clock_source: ClockSource::Onboard,
            sample_rate,
            edge: Edge::Rising,
            mode: SampleMode::Finite,
            sample_count,
        }).unwrap();
        driver.configure_input_buffer(1000).unwrap();
        driver
    }

    #[test]
    fn test_finite_mode_delivers_exactly_sample_count() {
        let mut driver = configured(100000.0, 64, 2);
        driver.start().unwrap();
        let mut data = vec![0.0; 32 * 2];
        let mut total = 0;
        for _ in 0..1000 {
            let rows = driver.read_batch(&mut data, 32, Duration::from_millis(100)).unwrap();
            assert!(rows <= 32);
            for &value in &data[..rows * 2] {
                assert!(value.abs() <= 0.05 + 1e-9);
            }
            total += rows;
            if total == 64 {
                break;
            }
        }
        assert_eq!(total, 64);
        // the well is dry: a further read times out with zero rows
        let rows = driver.read_batch(&mut data, 32, Duration::from_millis(10)).unwrap();
        assert_eq!(rows, 0);
        driver.stop().unwrap();
        driver.clear().unwrap();
    }

    #[test]
    fn test_read_without_task_is_an_error() {
        let mut driver = SimulatedDriverImpl::new();
        let mut data = vec![0.0; 8];
        let status = driver.read_batch(&mut data, 4, Duration::from_millis(1)).unwrap_err();
        assert_eq!(status, DeviceStatus(STATUS_NO_TASK));
        assert!(!driver.extended_error_info().is_empty());
    }

    #[test]
    fn test_start_requires_configuration() {
        let mut driver = SimulatedDriverImpl::new();
        driver.create_task("test").unwrap();
        let status = driver.start().unwrap_err();
        assert_eq!(status, DeviceStatus(STATUS_NOT_CONFIGURED));
    }

    #[test]
    fn test_read_before_start_is_an_error() {
        let mut driver = configured(1000.0, 10, 1);
        let mut data = vec![0.0; 8];
        let status = driver.read_batch(&mut data, 4, Duration::from_millis(1)).unwrap_err();
        assert_eq!(status, DeviceStatus(STATUS_NOT_STARTED));
    }
}
