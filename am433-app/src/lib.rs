//! Ambient stack around `am433-core`: input sources (file, sound card),
//! the raw-sample tee, the ASCII and binary packet sinks, the stats
//! aggregator, and the driver loop that wires them all together.

pub mod driver;
pub mod error;
pub mod sink;
pub mod source;
pub mod stats;
pub mod tee;

pub use driver::{Destination, Driver};
pub use error::CaptureError;
pub use sink::{AsciiSink, BinarySink, PacketSink};
pub use source::{FileSource, SampleSource, SoundcardSource};
pub use stats::StatsAggregator;
pub use tee::RawTee;
