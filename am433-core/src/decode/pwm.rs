use super::{push_bit, sample_at, DecodeOutput};
use crate::bits::BitWriter;
use crate::packet::Modulation;

/// Pulse-width modulation: one edge (rising or falling) is clocked
/// uniformly, the opposite edge encodes the bit via its offset within
/// the clock period.
pub(crate) fn decode_pwm(data: &[u8], start: i64, _cp_hint: i64) -> Option<DecodeOutput> {
    let len = data.len() as i64;

    let mut cp_rise: f64 = 0.0;
    let mut cp_fall: f64 = 0.0;
    let mut pt_rise = start;
    let mut pt_fall: i64 = -1;
    let mut ok_rise = true;
    let mut ok_fall = true;

    let mut pv = sample_at(data, start);
    let mut t = start;
    while t < len {
        let v = sample_at(data, t);
        if pv != v {
            if v == 1 {
                let pl = (t - pt_rise) as f64;
                if cp_rise == 0.0 {
                    cp_rise = pl;
                } else if !((0.8 * cp_rise < pl && pl < 1.3 * cp_rise) || !ok_rise) {
                    ok_rise = false;
                }
                pt_rise = t;
            } else {
                if pt_fall >= 0 {
                    let pl = (t - pt_fall) as f64;
                    if cp_fall == 0.0 {
                        cp_fall = pl;
                    } else if !((0.8 * cp_fall < pl && pl < 1.3 * cp_fall) || !ok_fall) {
                        ok_fall = false;
                    }
                }
                pt_fall = t;
            }
            pv = v;
        }
        t += 1;
    }

    let (cp, edge): (f64, u8) = if ok_rise {
        log::debug!("pwm: rising edge clock");
        (cp_rise, 1)
    } else if ok_fall {
        log::debug!("pwm: falling edge clock");
        (cp_fall, 0)
    } else {
        log::debug!("pwm: clock not constant on either edge");
        return None;
    };

    if cp == 0.0 {
        log::debug!("pwm: too short");
        return None;
    }

    log::debug!("pwm: guess cp={cp}");

    let mut w = BitWriter::new();
    let mut pt = start;
    pv = sample_at(data, start);
    let mut v = 0u8;
    t = start;
    while t < len {
        v = sample_at(data, t);
        if pv != v {
            let pl = (t - pt) as f64;
            if v == edge {
                if pl > 0.55 * cp {
                    if !push_bit(&mut w, 1) {
                        return None;
                    }
                } else if pl < 0.45 * cp {
                    if !push_bit(&mut w, 0) {
                        return None;
                    }
                } else {
                    log::debug!("pwm: ambiguous bit pl={pl} t={t}");
                    return None;
                }
            }
            pv = v;
            pt = t;
        }
        t += 1;
    }

    // Final partial cycle: one more bit, polarity inverted relative to
    // the main loop above. Preserved as found in the reference this
    // crate's decode bank is modelled on.
    if v == edge {
        let pl = (t - pt) as f64;
        if pl > 0.55 * cp {
            if !push_bit(&mut w, 0) {
                return None;
            }
        } else if pl < 0.45 * cp {
            if !push_bit(&mut w, 1) {
                return None;
            }
        } else {
            log::debug!("pwm: ambiguous final bit pl={pl} t={t}");
            return None;
        }
    }

    let (decoded, bitcount) = w.into_inner();
    Some(DecodeOutput {
        decoded,
        bitcount: bitcount as u32,
        modulation: Modulation::Pwm,
        cp: cp.round() as u32,
    })
}
