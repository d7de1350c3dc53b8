mod sys;
mod config;
mod device;
mod stats;
mod capture;
mod emit;

#[derive(Debug)]
pub enum Error {
    InvalidSampleRate(f64),
    InvalidDuration(f64),
    InvalidChannelCount(usize),
    CaptureTooShort { sample_rate: f64, duration: f64 },
    Device { operation: &'static str, status: i32, detail: String },
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InvalidSampleRate(sample_rate) =>
                write!(f, "sample rate {} Hz outside {}..{} Hz", sample_rate,
                    config::MIN_SAMPLE_RATE, config::MAX_SAMPLE_RATE),
            Self::InvalidDuration(duration) =>
                write!(f, "duration {} s is not positive", duration),
            Self::InvalidChannelCount(count) =>
                write!(f, "channel count {} is not positive", count),
            Self::CaptureTooShort { sample_rate, duration } =>
                write!(f, "{} s at {} Hz yields no complete sample", duration, sample_rate),
            Self::Device { operation, status, detail } =>
                write!(f, "device error {} in {}: {}", status, operation, detail),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use config::{
    InputMode,
    VoltageRange,
    ClockSource,
    Edge,
    SampleMode,
    ChannelSpec,
    Timing,
    CaptureConfiguration,
    AcquisitionParameters,
    MIN_SAMPLE_RATE,
    MAX_SAMPLE_RATE,
};

pub use sys::{
    DeviceStatus,
    Driver,
};

pub use stats::{
    Aggregator,
    ChannelStatistics,
};

pub use device::Device;

pub use capture::{
    CaptureSession,
    SessionState,
    Timebase,
};

pub use emit::write_row;
