//! Comfort noise payload of RFC 3389
//!
//! A generic CN payload carries the noise level in -dBov followed by up
//! to ten quantized reflection coefficients. SID frames are converted to
//! and from this representation so G.729 endpoints can interwork with
//! peers that only understand the generic format.

use super::basic_op::*;
use super::constants::{M, MP1};
use super::oper_32b::{l_comp, l_extract, mpy_32};
use crate::error::{CodecError, Result};

/// SID energy in dB that maps to 0 dBov
const DBOV_REF: Word16 = 90;
/// Largest level the payload can express
const MAX_LEVEL: u8 = 127;
/// Reflection coefficients are kept inside the unit circle
const K_LIMIT: i32 = 32512;

/// Level in dB of each SID gain index
pub fn sid_energy_db(index: Word16) -> Word16 {
    match index {
        i if i <= 0 => -12,
        i @ 1..=5 => 4 * i - 8,
        i => 2 * i.min(31) + 4,
    }
}

/// Generic comfort noise parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComfortNoise {
    /// Noise level, -dBov
    pub level: u8,
    /// Reflection coefficients, Q15
    pub reflection: [Word16; M],
    /// Number of coefficients carried
    pub order: usize,
}

impl ComfortNoise {
    /// Describe a SID by its LP filter (Q12) and quantized energy
    pub fn from_sid(lpc: &[Word16; MP1], energy_db: Word16) -> Self {
        let level = sub(DBOV_REF, energy_db).clamp(0, MAX_LEVEL as Word16) as u8;
        Self {
            level,
            reflection: lpc_to_reflection(lpc),
            order: M,
        }
    }

    /// Parse a payload: level byte, then one byte per coefficient
    pub fn parse(data: &[u8]) -> Result<Self> {
        let Some((&level, coeffs)) = data.split_first() else {
            return Err(CodecError::invalid_payload("empty comfort noise payload"));
        };
        if level > MAX_LEVEL {
            return Err(CodecError::invalid_payload(format!(
                "noise level {level} has the reserved bit set"
            )));
        }
        if coeffs.len() > M {
            return Err(CodecError::invalid_payload(format!(
                "{} reflection coefficients, at most {M} supported",
                coeffs.len()
            )));
        }

        let mut reflection = [0; M];
        for (k, &b) in reflection.iter_mut().zip(coeffs) {
            *k = dequantize_k(b);
        }
        Ok(Self {
            level,
            reflection,
            order: coeffs.len(),
        })
    }

    /// Serialize to the payload format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.order);
        out.push(self.level);
        out.extend(self.reflection[..self.order].iter().map(|&k| quantize_k(k)));
        out
    }

    /// Noise energy in the SID energy scale
    pub fn energy_db(&self) -> Word16 {
        sub(DBOV_REF, Word16::from(self.level))
    }

    /// Nearest SID gain index, lower index on ties
    pub fn gain_index(&self) -> Word16 {
        let target = self.energy_db();
        let mut best = 0;
        let mut best_dist = MAX_16;
        for i in 0..32 {
            let dist = abs_s(sub(sid_energy_db(i), target));
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best
    }

    /// LP filter in Q12 rebuilt with the step-up recursion
    pub fn lpc(&self) -> [Word16; MP1] {
        reflection_to_lpc(&self.reflection)
    }
}

/// `k * 128 + 127`, rounded, on one byte
fn quantize_k(k: Word16) -> u8 {
    let q = ((i32::from(k) + 128) >> 8) + 127;
    q.clamp(0, 254) as u8
}

fn dequantize_k(b: u8) -> Word16 {
    ((i32::from(b) - 127) << 8).clamp(-K_LIMIT, K_LIMIT) as Word16
}

/// Step-up recursion: reflection coefficients (Q15) to LP coefficients
/// (Q12), with the same DPF arithmetic as the Levinson solver
pub fn reflection_to_lpc(rc: &[Word16; M]) -> [Word16; MP1] {
    let mut ah = [0; MP1];
    let mut al = [0; MP1];
    let mut anh = [0; MP1];
    let mut anl = [0; MP1];

    for m in 1..=M {
        let l_k = l_deposit_h(rc[m - 1]);
        let (kh, kl) = l_extract(l_k);
        for j in 1..m {
            let t = mpy_32(kh, kl, ah[m - j], al[m - j]);
            let t = l_add(t, l_comp(ah[j], al[j]));
            (anh[j], anl[j]) = l_extract(t);
        }
        (anh[m], anl[m]) = l_extract(l_shr(l_k, 4));
        ah[1..=m].copy_from_slice(&anh[1..=m]);
        al[1..=m].copy_from_slice(&anl[1..=m]);
    }

    let mut a = [0; MP1];
    a[0] = 4096;
    for i in 1..=M {
        a[i] = round(l_shl(l_comp(ah[i], al[i]), 1));
    }
    a
}

/// Step-down recursion: LP coefficients (Q12) to reflection coefficients
/// (Q15)
///
/// Coefficients at or beyond the unit circle are clamped.
pub fn lpc_to_reflection(lpc: &[Word16; MP1]) -> [Word16; M] {
    const LIMIT: i64 = 1 << 31;
    // Q24
    let mut a = [0i64; MP1];
    for (d, &s) in a.iter_mut().zip(lpc.iter()) {
        *d = i64::from(s) << 12;
    }

    let mut rc = [0; M];
    for m in (1..=M).rev() {
        let k = (a[m] >> 9).clamp(-i64::from(K_LIMIT), i64::from(K_LIMIT));
        rc[m - 1] = k as Word16;

        // Q30
        let denom = (1i64 << 30) - k * k;
        let prev = a;
        for i in 1..m {
            let num = prev[i] - ((k * prev[m - i]) >> 15);
            a[i] = ((num << 30) / denom).clamp(-LIMIT, LIMIT);
        }
    }
    rc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::g729::lpc::Levinson;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..16)) {
            let parsed = ComfortNoise::parse(&data);
            let valid = !data.is_empty() && data.len() <= M + 1 && data[0] <= MAX_LEVEL;
            prop_assert_eq!(parsed.is_ok(), valid);
            if let Ok(cn) = parsed {
                prop_assert_eq!(cn.order, data.len() - 1);
                let lpc = cn.lpc();
                prop_assert_eq!(lpc[0], 4096);
            }
        }

        #[test]
        fn payload_bytes_round_trip(
            level in 0u8..=MAX_LEVEL,
            coeffs in proptest::collection::vec(0u8..=254, 0..=M),
        ) {
            let mut data = vec![level];
            data.extend_from_slice(&coeffs);
            let cn = ComfortNoise::parse(&data).unwrap();
            prop_assert_eq!(cn.to_bytes(), data);
        }
    }

    #[test]
    fn test_byte_255_is_clamped() {
        let cn = ComfortNoise::parse(&[10, 255]).unwrap();
        assert_eq!(cn.reflection[0], K_LIMIT as Word16);
        assert_eq!(cn.to_bytes(), vec![10, 254]);
    }

    #[test]
    fn test_gain_index_of_each_level() {
        for i in 0..32 {
            let cn = ComfortNoise {
                level: (DBOV_REF - sid_energy_db(i)) as u8,
                reflection: [0; M],
                order: 0,
            };
            assert_eq!(cn.gain_index(), i);
        }
    }

    #[test]
    fn test_level_is_clamped() {
        let mut flat = [0; MP1];
        flat[0] = 4096;
        assert_eq!(ComfortNoise::from_sid(&flat, 100).level, 0);
        assert_eq!(ComfortNoise::from_sid(&flat, -60).level, 127);
        assert_eq!(ComfortNoise::from_sid(&flat, 30).level, 60);
    }

    #[test]
    fn test_single_reflection() {
        let mut rc = [0; M];
        rc[0] = -16384;
        let a = reflection_to_lpc(&rc);
        assert_eq!(a[1], -2048);
        assert!(a[2..].iter().all(|&v| v == 0));
        assert_eq!(lpc_to_reflection(&a), rc);
    }

    #[test]
    fn test_recursions_invert_each_other() {
        // autocorrelation of a resonant signal
        let r: [f64; MP1] =
            core::array::from_fn(|i| 0.8f64.powi(i as i32) * (0.6 * i as f64).cos());
        let mut rh = [0; MP1];
        let mut rl = [0; MP1];
        for i in 0..MP1 {
            let v = (r[i] * 0.5 * 2f64.powi(31)) as i32;
            (rh[i], rl[i]) = l_extract(v);
        }
        let mut levinson = Levinson::new();
        let mut a = [0; MP1];
        let mut rc_ref = [0; M];
        levinson.solve(&rh, &rl, &mut a, &mut rc_ref).unwrap();

        let rc = lpc_to_reflection(&a);
        for (x, y) in rc.iter().zip(rc_ref.iter()) {
            assert!((*x as i32 - *y as i32).abs() < 200, "{rc:?} vs {rc_ref:?}");
        }
        let back = reflection_to_lpc(&rc);
        for (x, y) in back.iter().zip(a.iter()) {
            assert!((*x as i32 - *y as i32).abs() < 16, "{back:?} vs {a:?}");
        }
    }
}
