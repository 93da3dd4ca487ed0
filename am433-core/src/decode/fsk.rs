use super::{push_bit, sample_at, DecodeOutput};
use crate::bits::BitWriter;
use crate::packet::Modulation;

/// Frequency-shift keying: the high half of every bit has constant
/// duration, but the low-half duration (`dc`) and total period (`cp`)
/// differ between a 0-bit and a 1-bit template, inferred from the
/// waveform in a first pass and then matched against in a second.
pub(crate) fn decode_fsk(data: &[u8], start: i64, _cp_hint: i64) -> Option<DecodeOutput> {
    let len = data.len() as i64;

    let mut pt = start;
    let mut dc: f64 = 0.0;
    let mut pv = sample_at(data, start);

    let mut cp_one: f64 = 0.0;
    let mut dc_one: f64 = 0.0;
    let mut cp_zero: f64 = 0.0;
    let mut dc_zero: f64 = 0.0;

    let mut t = start;
    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            if pv == 0 {
                let pl = dc + (t - pt) as f64;
                if cp_one == 0.0 {
                    cp_one = pl;
                    dc_one = dc;
                } else if pl <= 0.9 * cp_one {
                    if cp_zero == 0.0 {
                        cp_zero = pl;
                        dc_zero = dc;
                    } else if pl > 0.9 * cp_zero && pl <= 1.1 * cp_zero {
                        if dc > 0.6 * dc_zero && dc <= 1.2 * dc_zero {
                            // zero, ok
                        } else {
                            log::debug!("fsk: dc inconsistent at {t}: {dc} != {dc_zero}");
                            return None;
                        }
                    } else {
                        log::debug!("fsk: cp inconsistent: too short at {t}");
                        return None;
                    }
                } else if pl > 0.9 * cp_one && pl <= 1.1 * cp_one {
                    if dc > 0.6 * dc_one && dc <= 1.2 * dc_one {
                        // one, ok
                    } else {
                        log::debug!("fsk: dc inconsistent at {t}: {dc} != {dc_one}");
                        return None;
                    }
                } else if pl > 1.1 * cp_one {
                    if cp_zero == 0.0 {
                        cp_zero = cp_one;
                        dc_zero = dc_one;
                        cp_one = pl;
                        dc_one = dc;
                    } else {
                        log::debug!("fsk: period matches neither template at {t}: pl={pl}");
                        return None;
                    }
                }
            } else {
                dc = (t - pt) as f64;
            }
            pv = v;
            pt = t;
        }
        t += 1;
    }

    log::debug!(
        "fsk: guess cp={} + {}, dc_one={dc_one}, dc_zero={dc_zero}",
        (cp_one + cp_zero) / 2.0,
        (cp_one - cp_zero) / 2.0
    );

    let mut w = BitWriter::new();
    pt = start;
    pv = sample_at(data, start);
    t = start;
    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            if pv == 0 {
                let pl = (t - pt) as f64;
                if pl > 0.9 * cp_zero && pl <= 1.1 * cp_zero {
                    if !push_bit(&mut w, 0) {
                        return None;
                    }
                } else if pl > 0.9 * cp_one && pl <= 1.1 * cp_one {
                    if !push_bit(&mut w, 1) {
                        return None;
                    }
                } else {
                    log::debug!("fsk: unreachable inconsistency at {t}");
                    return None;
                }
                pt = t;
            }
            pv = v;
        }
        t += 1;
    }

    // get the last bit
    dc = (t - pt) as f64;
    if dc > 0.6 * dc_zero && dc < 1.2 * dc_zero {
        push_bit(&mut w, 0);
    } else if dc > 0.6 * dc_one && dc <= 1.2 * dc_one {
        push_bit(&mut w, 1);
    }

    let (decoded, bitcount) = w.into_inner();
    Some(DecodeOutput {
        decoded,
        bitcount: bitcount as u32,
        modulation: Modulation::Fsk,
        cp: ((cp_one + cp_zero) / 2.0).round() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `high` is constant across both templates; `low` differs between a
    /// 0-bit and a 1-bit, which is what lets the decoder tell them apart.
    fn synth(bits: &[u8], high: usize, low_zero: usize, low_one: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for &b in bits {
            out.extend(std::iter::repeat(1u8).take(high));
            let low = if b == 1 { low_one } else { low_zero };
            out.extend(std::iter::repeat(0u8).take(low));
        }
        out
    }

    #[test]
    fn decodes_a_clean_fsk_stream() {
        let data = synth(&[0, 1, 0, 0, 1], 10, 10, 20);
        let out = decode_fsk(&data, 0, 0);
        assert!(out.is_some());
        assert_eq!(out.unwrap().modulation, Modulation::Fsk);
    }
}
