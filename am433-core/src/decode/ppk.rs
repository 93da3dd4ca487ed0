use super::{push_bit, sample_at, DecodeOutput};
use crate::bits::BitWriter;
use crate::packet::Modulation;

/// Pulse-position keying: bits are distinguished by which half of a
/// clock period is short vs long, relative to the signal's starting
/// polarity.
///
/// With `cp_hint == 0` this measures the first three pulse lengths and
/// retries itself with four candidate `(start, cp_hint)` pairs in turn,
/// keeping the first that decodes successfully.
pub(crate) fn decode_ppk(data: &[u8], start: i64, cp_hint: i64) -> Option<DecodeOutput> {
    let len = data.len() as i64;

    let mut pt = start;
    let mut pv = sample_at(data, pt);
    let polarity = pv;

    if cp_hint == 0 {
        let mut pl_detect = [0i64; 3];
        let mut clock = 0usize;

        let mut t = start;
        while t < len {
            let v = sample_at(data, t);
            if pv != v {
                pl_detect[clock] = t - pt;
                clock += 1;
                if clock >= 3 {
                    break;
                }
                pv = v;
                pt = t;
            }
            t += 1;
        }
        if clock < 3 {
            return None;
        }

        if let Some(out) = decode_ppk(data, start, pl_detect[0]) {
            return Some(out);
        }
        if let Some(out) = decode_ppk(data, start, pl_detect[1]) {
            return Some(out);
        }
        if let Some(out) = decode_ppk(data, start - pl_detect[1], pl_detect[1]) {
            return Some(out);
        }
        if let Some(out) = decode_ppk(data, start - pl_detect[2], pl_detect[2]) {
            return Some(out);
        }
        None
    } else {
        log::debug!("ppk: guess start={start} cp={cp_hint}");
        let cp = cp_hint as f64;

        let mut pl_zero: f64 = -1.0;
        let mut pl_one: f64 = -1.0;
        let mut w = BitWriter::new();

        let mut t = start;
        while t < len {
            let v = sample_at(data, t);
            if pv != v {
                if pv == 1 {
                    pl_one = (t - pt) as f64;
                } else {
                    pl_zero = (t - pt) as f64;
                }

                if pv != polarity {
                    if pl_one > 0.6 * cp && pl_one < 1.5 * cp {
                        if !push_bit(&mut w, 1) {
                            return None;
                        }
                    } else if pl_zero > 0.6 * cp && pl_zero < 1.5 * cp {
                        if !push_bit(&mut w, 0) {
                            return None;
                        }
                    } else {
                        log::debug!("ppk: inconsistent pl_one={pl_one} pl_zero={pl_zero} t={t}");
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
            modulation: Modulation::Ppk,
            cp: cp.round() as u32,
        })
    }
}
