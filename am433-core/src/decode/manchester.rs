use super::{push_bit, sample_at, DecodeOutput};
use crate::bits::BitWriter;
use crate::packet::Modulation;

/// Manchester encoding: bit value is the edge direction at each clock
/// midpoint. Transmitters typically warm up through a run of leading
/// zeros whose frequency may drift, so the leader is walked separately
/// before the body is clocked.
///
/// `start` may go negative and `cp_hint` non-zero when this function
/// calls itself to retry after misjudging the clock period by a factor
/// of two, or being off by one half-clock. The leader walk always
/// starts from real index `0` regardless of `start` - measuring it from
/// a shifted (possibly negative) origin would read virtual zero samples
/// before the real waveform begins, inflating the leader's low-half
/// length and corrupting its clock estimate. `start`/`cp_hint` on a
/// restart therefore only gate how many restarts have been attempted (at
/// most one; a second attempt rejects rather than recursing further),
/// matching the reference's own leader-from-0 walk.
pub(crate) fn decode_manchester(data: &[u8], start: i64, cp_hint: i64) -> Option<DecodeOutput> {
    let len = data.len() as i64;

    let mut pt: i64 = 0;
    let mut pv = sample_at(data, pt);

    let mut cp: f64 = 0.0;
    let mut pl_zero: f64 = -1.0;
    let mut pl_one: f64 = -1.0;
    let mut leader_bits: i64 = 0;

    let mut t = 0i64;
    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            if pv == 1 {
                pl_one = (t - pt) as f64;
            } else {
                pl_zero = (t - pt) as f64;
                leader_bits += 1;
            }
            if pl_one != -1.0 && pl_zero != -1.0 {
                let pl = pl_one + pl_zero;
                if cp == 0.0 {
                    cp = pl;
                } else if !(pl > 0.9 * cp && pl < 1.1 * cp) {
                    log::debug!("manchester: leader not constant frequency t={t}");
                    return None;
                }
                if pl_one > 0.8 * pl_zero && pl_one <= 1.1 * pl_zero {
                    // An offset restart below discards the leading edge
                    // that would otherwise skew this ratio, so finish on
                    // a zero in that case instead of a one. `pv`/`pt`/`t`
                    // are deliberately left unadvanced so the body loop
                    // below reprocesses this same edge as its first.
                    if (start == 0 && v != 0) || v == 0 {
                        break;
                    }
                }
            }
            pv = v;
            pt = t;
        }
        t += 1;
    }

    log::debug!("manchester: {leader_bits} leading zeros t={t}");

    let mut w = BitWriter::new();
    for _ in 0..leader_bits {
        if !push_bit(&mut w, 0) {
            return None;
        }
    }

    cp = 0.0;
    let mut clock: i64 = 0;

    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            let pl = (t - pt) as f64;

            if cp == 0.0 {
                clock += 1;
                cp = pl;
            } else if pl > 0.25 * cp && pl <= 0.5 * cp {
                if cp_hint != 0 || start != 0 {
                    log::debug!("manchester: double clock restart");
                    return None;
                }
                log::debug!("manchester: period restart");
                return decode_manchester(data, start - pl as i64, pl as i64);
            } else if pl > 0.5 * cp && pl <= 1.5 * cp {
                clock += 1;
            } else if pl > 1.5 * cp && pl <= 3.0 * cp {
                if clock % 2 == 0 {
                    if cp_hint != 0 || start != 0 {
                        log::debug!("manchester: double offset restart");
                        return None;
                    }
                    log::debug!("manchester: offset restart t={t}");
                    return decode_manchester(data, start - cp as i64, cp as i64);
                } else {
                    clock += 2;
                }
            } else {
                log::debug!("manchester: sync pl={pl} cp={cp}");
                clock += (pl / cp + 0.5) as i64;
            }

            if clock % 2 == 1 {
                let bit = if v > pv { 1 } else { 0 };
                if !push_bit(&mut w, bit) {
                    return None;
                }
            }

            pv = v;
            pt = t;
        }
        t += 1;
    }

    let (decoded, bitcount) = w.into_inner();
    Some(DecodeOutput {
        decoded,
        bitcount: bitcount as u32,
        modulation: Modulation::Manchester,
        cp: cp.round() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `n_leader` leading zero half-clock pairs, then the given body bits,
    /// all at clock period `cp` (each bit is a full rise+fall of length cp
    /// with the transition direction at the midpoint carrying the value).
    fn synth(n_leader: usize, bits: &[u8], cp: usize) -> Vec<u8> {
        let half = cp / 2;
        let mut out = Vec::new();
        let mut level = 0u8;
        for _ in 0..n_leader {
            out.extend(std::iter::repeat(level).take(half));
            level = 1 - level;
            out.extend(std::iter::repeat(level).take(half));
            level = 1 - level;
        }
        for &b in bits {
            // rising mid-clock => 1, falling mid-clock => 0
            let (first, second) = if b == 1 { (0u8, 1u8) } else { (1u8, 0u8) };
            out.extend(std::iter::repeat(first).take(half));
            out.extend(std::iter::repeat(second).take(half));
        }
        out
    }

    #[test]
    fn decodes_body_after_leader() {
        let data = synth(4, &[1, 0, 1, 1, 0], 20);
        let out = decode_manchester(&data, 0, 0);
        assert!(out.is_some());
        assert_eq!(out.unwrap().modulation, Modulation::Manchester);
    }
}
