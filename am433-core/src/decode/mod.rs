mod binary;
mod fsk;
mod leader;
mod manchester;
mod ppk;
mod pwm;

pub use leader::peel;

use crate::bits::BitWriter;
use crate::packet::{Modulation, Packet};

/// Result of a successful decode attempt, prior to being copied back
/// into a [`Packet`].
pub(crate) struct DecodeOutput {
    pub decoded: Vec<u8>,
    pub bitcount: u32,
    pub modulation: Modulation,
    pub cp: u32,
}

/// A decoder attempts to fit a modulation model to `data[max(start,0)..]`
/// (virtual samples before index 0 read as `0`, which lets the leader
/// peeler and the self-restarting decoders rewind `start` past the
/// front of the buffer). `cp_hint` seeds the expected clock period in
/// samples; `0` means "infer it from the waveform".
pub(crate) type DecoderFn = fn(&[u8], i64, i64) -> Option<DecodeOutput>;

/// Every decoder `am433-core` knows how to run, keyed by the tag it
/// writes on success. The leader/trailer peeler and the CLI's `-m`
/// exhaustive mode both index into this table; the default dispatch in
/// [`decode_packet`] only tries `Binary`.
pub(crate) const DECODERS: &[(Modulation, DecoderFn)] = &[
    (Modulation::Pwm, pwm::decode_pwm),
    (Modulation::Fsk, fsk::decode_fsk),
    (Modulation::Manchester, manchester::decode_manchester),
    (Modulation::Ppk, ppk::decode_ppk),
    (Modulation::Binary, binary::decode_binary),
];

pub(crate) fn sample_at(data: &[u8], t: i64) -> u8 {
    if t < 0 {
        0
    } else {
        data.get(t as usize).copied().unwrap_or(0)
    }
}

/// Cap matching `DECODESIZE` bytes of packed output; a decoder that
/// would overrun it rejects rather than panicking, where the reference
/// implementation's fixed buffer would have simply overflowed.
const MAX_BITS: usize = crate::packetizer::DECODESIZE * 8;

pub(crate) fn push_bit(w: &mut BitWriter, bit: u8) -> bool {
    if w.bitcount() >= MAX_BITS {
        return false;
    }
    w.push_bit(bit);
    true
}

/// Run the default dispatch (binary only) against a freshly packetized
/// packet, filling in its decode fields on success and leaving it
/// tagged [`Modulation::Unknown`] otherwise.
pub fn decode_packet(packet: &mut Packet) {
    if let Some(out) = binary::decode_binary(&packet.data, 0, 0) {
        apply(packet, out);
    } else {
        packet.modulation = Modulation::Unknown;
        packet.bitcount = 0;
        packet.cp = 0;
        packet.decoded.clear();
    }
}

/// Try every decoder in [`DECODERS`], each behind the leader/trailer
/// peeler, and keep the first success. Used by tooling that wants a
/// best-effort classification rather than the reference's binary-only
/// default.
pub fn decode_packet_exhaustive(packet: &mut Packet) {
    for &(_, f) in DECODERS {
        if let Some((out, leader_edges, trailer_edges)) = leader::peel(f, &packet.data) {
            packet.leader_edges = leader_edges;
            packet.trailer_edges = trailer_edges;
            apply(packet, out);
            return;
        }
    }
    packet.modulation = Modulation::Unknown;
    packet.bitcount = 0;
    packet.cp = 0;
    packet.decoded.clear();
}

fn apply(packet: &mut Packet, out: DecodeOutput) {
    packet.decoded = out.decoded;
    packet.bitcount = out.bitcount;
    packet.modulation = out.modulation;
    packet.cp = out.cp;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_at_treats_negative_index_as_zero() {
        let data = [1u8, 1, 0, 1];
        assert_eq!(sample_at(&data, -5), 0);
        assert_eq!(sample_at(&data, 0), 1);
        assert_eq!(sample_at(&data, 3), 1);
        assert_eq!(sample_at(&data, 100), 0);
    }
}
