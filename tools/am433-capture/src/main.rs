use std::error::Error;
use std::io::{stdout, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use am433_app::{AsciiSink, BinarySink, Destination, Driver, FileSource, RawTee, SampleSource, SoundcardSource, StatsAggregator};
use am433_core::FS;
use clap::Parser;
use log::error;

/// 433 MHz OOK baseband packetizer and decoder - capture from a file or
/// sound card, emit decoded packets as ASCII or a compact binary frame,
/// or report channel utilization statistics.
#[derive(Parser)]
struct Args {
    /// Read raw samples from this file instead of a sound card.
    #[arg(short = 'f', value_name = "FILE", conflicts_with = "device")]
    file: Option<PathBuf>,

    /// Capture raw samples from this sound card (by cpal device name).
    #[arg(short = 'd', value_name = "DEVICE", conflicts_with = "file")]
    device: Option<String>,

    /// Write the raw sample stream verbatim to this file as it is read.
    #[arg(short = 'l', value_name = "LOGFILE")]
    logfile: Option<PathBuf>,

    /// Emit packets as the compact binary frame format rather than ASCII.
    #[arg(short = 'm')]
    binary: bool,

    /// Report channel utilization statistics instead of decoding packets.
    #[arg(short = 's')]
    stats: bool,

    /// Interval, in seconds, over which `-s` reports utilization.
    #[arg(long = "stats-interval", default_value_t = 1, requires = "stats")]
    stats_interval: u64,

    /// Stop after this many seconds of samples.
    #[arg(short = 't', value_name = "SECONDS")]
    time_limit: Option<u64>,

    /// Trace every decoder's internal reasoning on standard error.
    #[arg(short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let fs = FS;

    let mut source: Box<dyn SampleSource> = match (&args.file, &args.device) {
        (Some(path), None) => Box::new(FileSource::open(path)?),
        (None, Some(device)) => Box::new(SoundcardSource::open(Some(device.as_str()), fs)?),
        (None, None) => Box::new(SoundcardSource::open(None, fs)?),
        (Some(_), Some(_)) => unreachable!("clap rejects -f and -d together"),
    };

    let mut tee = args.logfile.as_ref().map(RawTee::create).transpose()?;

    let sample_limit = args.time_limit.map(|secs| secs * fs as u64);
    let driver = Driver::new(fs, sample_limit);

    let stdout = stdout();
    let out = BufWriter::new(stdout.lock());

    if args.stats {
        let capture_start = source.capture_start();
        let boxed_out: Box<dyn std::io::Write> = Box::new(out);
        let mut stats = StatsAggregator::new(fs, args.stats_interval, capture_start, boxed_out);
        driver.run(
            source.as_mut(),
            Destination::Stats(&mut stats),
            tee.as_mut(),
        )?;
    } else if args.binary {
        let mut sink = BinarySink::new(out);
        driver.run(
            source.as_mut(),
            Destination::Decode(&mut sink),
            tee.as_mut(),
        )?;
    } else {
        let mut sink = AsciiSink::new(out);
        driver.run(
            source.as_mut(),
            Destination::Decode(&mut sink),
            tee.as_mut(),
        )?;
    }

    Ok(())
}
