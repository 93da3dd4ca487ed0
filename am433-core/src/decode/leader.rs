use super::{sample_at, DecodeOutput, DecoderFn};

/// Position of the `n`-th rising edge (0→1 transition) at or after
/// `start`, walking forward. `n == 0` returns `start` itself.
fn lfind_edge(data: &[u8], start: i64, mut n: u32) -> Option<i64> {
    if n == 0 {
        return Some(start);
    }
    let len = data.len() as i64;
    let mut pv = sample_at(data, start);
    let mut t = start;
    while t < len {
        let v = sample_at(data, t);
        if pv != v && v == 1 {
            n -= 1;
            if n == 0 {
                return Some(t);
            }
        }
        pv = v;
        t += 1;
    }
    None
}

/// Position of the `n`-th rising edge counting backward from the end
/// of the buffer. `n == 0` returns `data.len()`.
///
/// This always scans the whole buffer from the end regardless of
/// `start` - the reference routine this is modelled on never reads its
/// own `start` parameter either. Preserved rather than "fixed", since
/// the leader/trailer search is symmetric in practice (both ends of a
/// packet are searched from their own edge inward).
fn rfind_edge(data: &[u8], _start: i64, mut n: u32) -> Option<i64> {
    if n == 0 {
        return Some(data.len() as i64);
    }
    if data.is_empty() {
        return None;
    }
    let mut pv = data[data.len() - 1];
    let mut t = data.len() as i64 - 1;
    while t >= 0 {
        let v = data[t as usize];
        if pv != v && v == 1 {
            n -= 1;
            if n == 0 {
                return Some(t);
            }
        }
        pv = v;
        t -= 1;
    }
    None
}

/// Retry `f` over every combination of stripping 0-3 leading and 0-3
/// trailing edges, narrowing the decoder's view of `data` each time.
/// Returns the first successful decode along with how many leading and
/// trailing edges were stripped to get it.
///
/// A combination whose edge count isn't available in `data` (too few
/// transitions) is simply skipped rather than aborting the whole
/// search - a packet short on trailing edges may still have every
/// leading-edge combination worth trying, and vice versa.
pub(crate) fn peel(f: DecoderFn, data: &[u8]) -> Option<(DecodeOutput, u8, u8)> {
    let start = 0i64;

    for lstopn in 0..4u32 {
        let Some(lstop) = rfind_edge(data, start, lstopn) else {
            continue;
        };

        for lstartn in 0..4u32 {
            let Some(lstart) = lfind_edge(data, start, lstartn) else {
                continue;
            };

            let view = &data[..lstop.max(0) as usize];
            if let Some(out) = f(view, lstart, 0) {
                return Some((out, lstartn as u8, lstopn as u8));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::binary::decode_binary;

    fn pulses(spec: &[(u8, usize)]) -> Vec<u8> {
        let mut out = Vec::new();
        for &(v, n) in spec {
            out.extend(std::iter::repeat(v).take(n));
        }
        out
    }

    #[test]
    fn strips_spurious_leading_edges_before_a_clean_region() {
        // 3 short spurious pulses, then a clean binary region.
        let mut data = pulses(&[(1, 2), (0, 2), (1, 2), (0, 2), (1, 2), (0, 2)]);
        data.extend(pulses(&[(1, 10), (0, 10), (1, 20), (0, 10)]));
        let result = peel(decode_binary, &data);
        assert!(result.is_some());
        let (_, leader_edges, _) = result.unwrap();
        assert!(leader_edges <= 3);
    }

    #[test]
    fn lfind_edge_counts_rising_edges_forward() {
        let data = pulses(&[(0, 2), (1, 2), (0, 2), (1, 2), (0, 2)]);
        assert_eq!(lfind_edge(&data, 0, 0), Some(0));
        assert_eq!(lfind_edge(&data, 0, 1), Some(2));
        assert_eq!(lfind_edge(&data, 0, 2), Some(6));
        assert_eq!(lfind_edge(&data, 0, 3), None);
    }

    #[test]
    fn rfind_edge_counts_rising_edges_backward() {
        let data = pulses(&[(0, 2), (1, 2), (0, 2), (1, 2), (0, 2)]);
        assert_eq!(rfind_edge(&data, 0, 0), Some(data.len() as i64));
        assert_eq!(rfind_edge(&data, 0, 1), Some(6));
        assert_eq!(rfind_edge(&data, 0, 2), Some(2));
    }
}
