use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use am433_core::Packet;

use crate::error::CaptureError;

/// Channel-utilization sink: an alternative to the decode-and-emit path
/// that reports the fraction of high-valued samples over fixed
/// intervals, fed one packet at a time (§4.5, §10.8).
///
/// Idle runs between packets are never observed directly - only a
/// packet's own `start`/`end`/`data` are - so the aggregator
/// reconstructs them as runs of zero-valued samples when it sees the
/// next packet arrive. The very first idle run, before any packet has
/// been seen, is discarded rather than backfilled: there is nothing yet
/// to anchor its interval boundaries to.
pub struct StatsAggregator<W> {
    fs: u32,
    interval_len: u64,
    capture_start: SystemTime,
    out: W,
    header_written: bool,
    started: bool,
    cursor: u64,
    interval_start: u64,
    ones: u64,
}

impl<W: Write> StatsAggregator<W> {
    pub fn new(fs: u32, interval_s: u64, capture_start: SystemTime, out: W) -> Self {
        Self {
            fs,
            interval_len: interval_s.max(1) * fs as u64,
            capture_start,
            out,
            header_written: false,
            started: false,
            cursor: 0,
            interval_start: 0,
            ones: 0,
        }
    }

    pub fn process_packet(&mut self, packet: &Packet) -> Result<(), CaptureError> {
        if !self.started {
            self.started = true;
            self.cursor = packet.start;
            self.interval_start = (packet.start / self.interval_len) * self.interval_len;
        } else {
            self.advance_zeros(packet.start)?;
        }

        for &v in &packet.data {
            self.tick(v)?;
        }
        Ok(())
    }

    /// Call once at end of stream to flush zero-activity up to the last
    /// sample actually read; any final partial interval is left
    /// unemitted, as only a crossed boundary triggers a line.
    pub fn finish(&mut self, total_samples: u64) -> Result<(), CaptureError> {
        if self.started {
            self.advance_zeros(total_samples)?;
        }
        Ok(())
    }

    fn advance_zeros(&mut self, upto: u64) -> Result<(), CaptureError> {
        while self.cursor < upto {
            self.tick(0)?;
        }
        Ok(())
    }

    fn tick(&mut self, v: u8) -> Result<(), CaptureError> {
        if v != 0 {
            self.ones += 1;
        }
        self.cursor += 1;
        if self.cursor - self.interval_start >= self.interval_len {
            self.emit_interval()?;
            self.interval_start += self.interval_len;
            self.ones = 0;
        }
        Ok(())
    }

    fn emit_interval(&mut self) -> Result<(), CaptureError> {
        if !self.header_written {
            writeln!(self.out, "#time\t\tutil\tacts\talls").map_err(CaptureError::OutputWrite)?;
            self.header_written = true;
        }
        let offset = Duration::from_secs_f64(self.interval_start as f64 / self.fs as f64);
        let unix_seconds = (self.capture_start + offset)
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        let util = 100.0 * self.ones as f64 / self.interval_len as f64;
        writeln!(
            self.out,
            "{unix_seconds}\t{util:.2}\t{}\t{}",
            self.ones, self.interval_len
        )
        .map_err(CaptureError::OutputWrite)
    }
}
