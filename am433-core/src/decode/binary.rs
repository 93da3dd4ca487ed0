use super::{push_bit, sample_at, DecodeOutput};
use crate::bits::BitWriter;
use crate::packet::Modulation;

/// Unencoded clocked stream: each bit lasts an integer multiple of an
/// unknown clock period, inferred from the packet's own pulse lengths.
pub(crate) fn decode_binary(data: &[u8], start: i64, _cp_hint: i64) -> Option<DecodeOutput> {
    let len = data.len() as i64;

    // First pass: shortest pulse seen becomes the initial clock guess.
    let mut cp: f64 = -1.0;
    let mut pt = start;
    let mut pv = sample_at(data, start);
    let mut t = start;
    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            let pl = (t - pt) as f64;
            if pl < 2.0 {
                log::debug!("binary: pulse too short t={t}");
                return None;
            }
            if cp < 0.0 || pl < cp {
                cp = pl;
            }
            pv = v;
            pt = t;
        }
        t += 1;
    }

    log::debug!("binary: first guess cp={cp:.2}");

    // Second pass: refine the clock estimate and reject inconsistent pulses.
    pt = start;
    pv = sample_at(data, start);
    t = start;
    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            let pl = (t - pt) as f64;
            if pl < cp {
                cp = (cp * 2.0 + pl) / 3.0;
            } else if pl > cp {
                let r = pl / cp;
                let n = r.round();
                let e = ((r - n) / n).abs();
                if e > 0.3 {
                    log::debug!("binary: inconsistent pulse length cp={cp:.2} pl={pl} t={t}");
                    return None;
                }
                if n > 20.0 {
                    log::debug!("binary: too many consecutive bits {n} t={t}");
                    return None;
                }
                cp = (cp * 2.0 + pl / n) / 3.0;
            }
            pv = v;
            pt = t;
        }
        t += 1;
    }

    log::debug!("binary: cp={cp:.2}");

    // Third pass: emit round(pl/cp) copies of each pulse's polarity.
    let mut w = BitWriter::new();
    pt = start;
    pv = sample_at(data, start);
    t = start;
    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            let pl = (t - pt) as f64;
            let nbits = (pl / cp).round() as i64;
            for _ in 0..nbits {
                if !push_bit(&mut w, pv) {
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
        modulation: Modulation::Binary,
        cp: cp.round() as u32,
    })
}
