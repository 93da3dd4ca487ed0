use crate::packet::{Modulation, Packet};

/// A decoded packet is noise when it is too short to mean anything, or
/// when its bits are uniformly 0 or uniformly 1. An [`Modulation::Unknown`]
/// packet is never classified as noise by the bit-count check below - it
/// has no decoded bits to judge, only a raw sample count, and the caller
/// is expected to have already applied the `len < 2` pre-filter (see
/// [`too_short_to_process`]) before reaching this point.
pub fn is_noise(packet: &Packet) -> bool {
    if packet.bitcount <= 8 {
        return packet.modulation != Modulation::Unknown;
    }

    let full_bytes = (packet.bitcount / 8) as usize;

    let mut is_all_ones = true;
    let mut is_all_zeros = true;
    for byte in &packet.decoded[..full_bytes] {
        if *byte != 0xff {
            is_all_ones = false;
        }
        if *byte != 0x00 {
            is_all_zeros = false;
        }
    }

    let remaining = packet.bitcount as usize % 8;
    if remaining > 0 {
        let last_mask: u8 = (1 << (8 - remaining)) - 1;
        let last_byte = packet.decoded.get(full_bytes).copied().unwrap_or(0);
        if is_all_ones && (last_byte | last_mask) != 0xff {
            is_all_ones = false;
        }
        if is_all_zeros && last_byte != 0x00 {
            is_all_zeros = false;
        }
    }

    is_all_ones || is_all_zeros
}

/// Packets this short never carried anything worth decoding; the
/// reference skips `process_packet` entirely rather than running any
/// decoder against them.
pub fn too_short_to_process(packet: &Packet) -> bool {
    packet.len() < 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;

    fn packet_with_bits(bits: &[u8]) -> Packet {
        let mut w = BitWriter::new();
        for &b in bits {
            w.push_bit(b);
        }
        let (decoded, bitcount) = w.into_inner();
        let mut p = Packet::new(0);
        p.decoded = decoded;
        p.bitcount = bitcount as u32;
        p.modulation = Modulation::Binary;
        p
    }

    #[test]
    fn all_ones_is_noise() {
        let p = packet_with_bits(&[1; 16]);
        assert!(is_noise(&p));
    }

    #[test]
    fn all_ones_with_partial_last_byte_is_noise() {
        let p = packet_with_bits(&[1; 10]);
        assert!(is_noise(&p));
    }

    #[test]
    fn mostly_ones_with_one_zero_is_not_noise() {
        // 9 bits clears the <= 8 short-packet rule, so content is judged.
        let mut bits = vec![1u8; 8];
        bits.push(0);
        let p = packet_with_bits(&bits);
        assert!(!is_noise(&p));
    }

    #[test]
    fn too_few_bits_with_known_modulation_is_noise() {
        let p = packet_with_bits(&[1, 0, 1]);
        assert!(is_noise(&p));
    }

    #[test]
    fn unknown_modulation_is_never_noise_by_bitcount() {
        let mut p = packet_with_bits(&[1, 0, 1]);
        p.modulation = Modulation::Unknown;
        assert!(!is_noise(&p));
    }
}
