use std::io::Write;
use std::process;

use clap::Parser;

use daqstream::{AcquisitionParameters, CaptureConfiguration, CaptureSession, Device};

/// Stream a finite multi-channel analog capture to standard output.
///
/// Writes one comma-separated record per sample row to standard output;
/// progress and errors go to standard error.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Sample rate per channel, in Hz (1 to 250000)
    sample_rate: f64,
    /// Capture duration, in seconds
    duration: f64,
    /// Report per-channel minimum and average after the capture
    #[arg(long)]
    summary: bool,
}

fn capture(args: &Args) -> daqstream::Result<()> {
    let config = CaptureConfiguration::default();
    let parameters = AcquisitionParameters::new(args.sample_rate, args.duration,
        config.channels.count as usize)?;
    log::info!("sample rate: {} Hz", parameters.sample_rate());
    log::info!("duration: {} s", parameters.duration());
    log::info!("target sample count: {}", parameters.target_sample_count());

    let device = Device::new()?;
    let mut session = CaptureSession::new(device, config, parameters);

    let stdout = std::io::stdout();
    let mut sink = std::io::BufWriter::new(stdout.lock());
    session.run(&mut sink)?;
    sink.flush()?;

    if args.summary {
        for (channel, statistics) in session.statistics().channels().enumerate() {
            if let Some(average) = statistics.average() {
                log::info!("channel {}: minimum {:+.6} V, average {:+.6} V",
                    channel + 1, statistics.minimum(), average);
                if statistics.minimum() < 0.0 {
                    log::info!("channel {} went negative", channel + 1);
                }
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            // clap renders its own usage text; help and version still exit zero
            let _ = error.print();
            process::exit(if error.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(error) = capture(&args) {
        log::error!("{}", error);
        process::exit(1);
    }
}
