use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use am433_core::{Modulation, Packet};

use crate::error::CaptureError;

/// Consumes a decoded (or unknown) packet, one at a time, flushing its
/// own output as it goes - there is no buffering beyond a flush per
/// packet (§6).
pub trait PacketSink {
    fn emit(&mut self, packet: &Packet, capture_start: SystemTime, fs: u32)
        -> Result<(), CaptureError>;
}

fn packet_timestamp(packet: &Packet, capture_start: SystemTime, fs: u32) -> SystemTime {
    capture_start + Duration::from_secs_f64(packet.start as f64 / fs as f64)
}

/// Whitespace-delimited human-readable emitter, one block per packet.
pub struct AsciiSink<W> {
    out: W,
}

impl<W: Write> AsciiSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PacketSink for AsciiSink<W> {
    fn emit(&mut self, packet: &Packet, _capture_start: SystemTime, fs: u32) -> Result<(), CaptureError> {
        let len = packet.len() as u64;
        writeln!(
            self.out,
            "PACKET: {} ({:.6} s) {} ({:.6} s) {} ({:.6} s)",
            packet.start,
            packet.start as f64 / fs as f64,
            packet.end,
            packet.end as f64 / fs as f64,
            len,
            len as f64 / fs as f64,
        )
        .map_err(CaptureError::OutputWrite)?;

        if packet.modulation == Modulation::Unknown {
            writeln!(self.out, "    mod   unknown").map_err(CaptureError::OutputWrite)?;
        } else {
            writeln!(self.out, "    mod   {}", packet.modulation as u8)
                .map_err(CaptureError::OutputWrite)?;
            if packet.cp > 0 {
                writeln!(self.out, "    clock {} Hz", packet.clock_hz(fs))
                    .map_err(CaptureError::OutputWrite)?;
            }
            let hex: String = packet.decoded.iter().map(|b| format!("{b:02x}")).collect();
            writeln!(self.out, "    data  {hex}").map_err(CaptureError::OutputWrite)?;
        }
        self.out.flush().map_err(CaptureError::OutputWrite)
    }
}

/// Compact binary frame emitter, matching the 19-byte little-endian
/// header described in §6 followed by the payload bytes.
pub struct BinarySink<W> {
    out: W,
}

impl<W: Write> BinarySink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PacketSink for BinarySink<W> {
    fn emit(&mut self, packet: &Packet, capture_start: SystemTime, fs: u32) -> Result<(), CaptureError> {
        let timestamp = packet_timestamp(packet, capture_start, fs);
        let timestamp_us = timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_micros() as u64;

        let (bitcount, clock_hz, payload): (u32, u32, &[u8]) = if packet.modulation == Modulation::Unknown {
            ((packet.len() as u32) * 8, fs, &packet.data)
        } else {
            (packet.bitcount, packet.clock_hz(fs), &packet.decoded)
        };

        let mut header = Vec::with_capacity(19);
        header.extend_from_slice(&timestamp_us.to_le_bytes());
        header.extend_from_slice(&bitcount.to_le_bytes());
        header.extend_from_slice(&clock_hz.to_le_bytes());
        header.push(packet.modulation as u8);
        header.push(packet.leader_edges);
        header.push(packet.trailer_edges);

        self.out.write_all(&header).map_err(CaptureError::OutputWrite)?;
        self.out.write_all(payload).map_err(CaptureError::OutputWrite)?;
        self.out.flush().map_err(CaptureError::OutputWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(bitcount: u32, modulation: Modulation, cp: u32) -> Packet {
        let decoded = vec![0u8; bitcount.div_ceil(8) as usize];
        let mut p = Packet::new(0);
        p.end = 100;
        p.data = vec![1u8; 100];
        p.decoded = decoded;
        p.bitcount = bitcount;
        p.modulation = modulation;
        p.cp = cp;
        p
    }

    #[test]
    fn binary_frame_header_matches_spec_example() {
        // bitcount = 17, modulation = Binary, cp = 24 -> clock_hz = 2000, 3 payload bytes.
        let p = packet(17, Modulation::Binary, 24);
        let mut buf = Vec::new();
        {
            let mut sink = BinarySink::new(&mut buf);
            sink.emit(&p, SystemTime::UNIX_EPOCH, 48000).unwrap();
        }
        assert_eq!(buf.len(), 19 + 3);
        let bitcount = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let clock_hz = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        assert_eq!(bitcount, 17);
        assert_eq!(clock_hz, 2000);
        assert_eq!(buf[16], Modulation::Binary as u8);
    }

    #[test]
    fn unknown_packet_carries_raw_data_as_payload() {
        let mut p = packet(0, Modulation::Unknown, 0);
        p.data = vec![1, 0, 1, 1];
        let mut buf = Vec::new();
        {
            let mut sink = BinarySink::new(&mut buf);
            sink.emit(&p, SystemTime::UNIX_EPOCH, 48000).unwrap();
        }
        let bitcount = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        assert_eq!(bitcount, 4 * 8);
        assert_eq!(&buf[19..], &[1, 0, 1, 1]);
    }
}
