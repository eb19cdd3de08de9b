//! Linear prediction analysis
//!
//! Windowing, autocorrelation with dynamic scaling, lag windowing and the
//! Levinson-Durbin recursion. Autocorrelations travel in DPF format
//! (`hi`/`lo` pairs, see [`super::oper_32b`]).

use super::basic_op::*;
use super::constants::{L_WINDOW, M, MP1};
use super::oper_32b::{div_32, l_comp, l_extract, mpy_32};
use super::tables::{HAMWINDOW, LAG_H, LAG_L};
use tracing::warn;

/// Windowed autocorrelation of one analysis window
///
/// # Arguments
/// * `x` - Input signal (240 samples)
/// * `m` - Highest lag to compute
/// * `r_h` - Output autocorrelations MSB (`m + 1` entries)
/// * `r_l` - Output autocorrelations LSB (`m + 1` entries)
///
/// Returns the exponent of `r[0]`: the energy of the windowed signal is
/// `r[0] * 2^exp_r0` in the integer domain. `r[0]` is never zero.
pub fn autocorr(x: &[Word16], m: usize, r_h: &mut [Word16], r_l: &mut [Word16]) -> Word16 {
    debug_assert!(x.len() >= L_WINDOW);
    debug_assert!(r_h.len() > m && r_l.len() > m);

    let mut y = [0; L_WINDOW];
    for i in 0..L_WINDOW {
        y[i] = mult_r(x[i], HAMWINDOW[i]);
    }

    let mut exp_r0: Word16 = 1;
    let mut sum;
    loop {
        let mut overflow = false;
        sum = 1;
        for &v in y.iter() {
            sum = l_mac_o(sum, v, v, &mut overflow);
        }
        if !overflow {
            break;
        }
        for v in y.iter_mut() {
            *v = shr(*v, 2);
        }
        exp_r0 = add(exp_r0, 4);
    }

    let norm = norm_l(sum);
    sum = l_shl(sum, norm);
    (r_h[0], r_l[0]) = l_extract(sum);
    exp_r0 = sub(exp_r0, norm);

    for i in 1..=m {
        let mut sum: Word32 = 0;
        for j in 0..L_WINDOW - i {
            sum = l_mac(sum, y[j], y[j + i]);
        }
        sum = l_shl(sum, norm);
        (r_h[i], r_l[i]) = l_extract(sum);
    }

    exp_r0
}

/// Apply the lag window to lags `1..=m`
pub fn lag_window(m: usize, r_h: &mut [Word16], r_l: &mut [Word16]) {
    for i in 1..=m {
        let x = mpy_32(r_h[i], r_l[i], LAG_H[i - 1], LAG_L[i - 1]);
        (r_h[i], r_l[i]) = l_extract(x);
    }
}

/// Levinson-Durbin solver
///
/// Keeps the last stable filter so an unstable solution can be replaced.
#[derive(Debug, Clone)]
pub struct Levinson {
    old_a: [Word16; MP1],
    old_rc: [Word16; 2],
}

impl Default for Levinson {
    fn default() -> Self {
        let mut old_a = [0; MP1];
        old_a[0] = 4096;
        Self {
            old_a,
            old_rc: [0; 2],
        }
    }
}

impl Levinson {
    /// Create a solver with a flat previous filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Solve the normal equations of order 10
    ///
    /// # Arguments
    /// * `rh` - Autocorrelations MSB
    /// * `rl` - Autocorrelations LSB
    /// * `a` - Output LPC coefficients in Q12, `a[0] = 1.0`
    /// * `rc` - Output reflection coefficients in Q15
    ///
    /// Returns the residual prediction energy, or `None` when a reflection
    /// coefficient reached the unit circle; the previous filter and its first
    /// two reflection coefficients are then written to `a` and `rc`.
    pub fn solve(
        &mut self,
        rh: &[Word16],
        rl: &[Word16],
        a: &mut [Word16; MP1],
        rc: &mut [Word16; M],
    ) -> Option<Word16> {
        let mut ah = [0; MP1];
        let mut al = [0; MP1];
        let mut anh = [0; MP1];
        let mut anl = [0; MP1];

        // K = A[1] = -R[1] / R[0]
        let t1 = l_comp(rh[1], rl[1]);
        let t2 = l_abs(t1);
        let mut t0 = div_32(t2, rh[0], rl[0]);
        if t1 > 0 {
            t0 = l_negate(t0);
        }
        let (mut kh, mut kl) = l_extract(t0);
        rc[0] = kh;
        t0 = l_shr(t0, 4);
        (ah[1], al[1]) = l_extract(t0);

        // Alpha = R[0] * (1 - K**2)
        t0 = mpy_32(kh, kl, kh, kl);
        t0 = l_abs(t0);
        t0 = l_sub(MAX_32, t0);
        let (hi, lo) = l_extract(t0);
        t0 = mpy_32(rh[0], rl[0], hi, lo);

        let mut alp_exp = norm_l(t0);
        t0 = l_shl(t0, alp_exp);
        let (mut alp_h, mut alp_l) = l_extract(t0);

        for i in 2..=M {
            // t0 = SUM(R[j]*A[i-j], j=1,i-1) + R[i]
            t0 = 0;
            for j in 1..i {
                t0 = l_add(t0, mpy_32(rh[j], rl[j], ah[i - j], al[i - j]));
            }
            t0 = l_shl(t0, 4);
            t0 = l_add(t0, l_comp(rh[i], rl[i]));

            // K = -t0 / Alpha
            let t1 = l_abs(t0);
            let mut t2 = div_32(t1, alp_h, alp_l);
            if t0 > 0 {
                t2 = l_negate(t2);
            }
            t2 = l_shl(t2, alp_exp);
            (kh, kl) = l_extract(t2);
            rc[i - 1] = kh;

            if abs_s(kh) > 32750 {
                *a = self.old_a;
                rc[0] = self.old_rc[0];
                rc[1] = self.old_rc[1];
                warn!("unstable LP filter at order {}, reusing previous filter", i);
                return None;
            }

            // An[j] = A[j] + K*A[i-j]
            for j in 1..i {
                let t = mpy_32(kh, kl, ah[i - j], al[i - j]);
                let t = l_add(t, l_comp(ah[j], al[j]));
                (anh[j], anl[j]) = l_extract(t);
            }
            t2 = l_shr(t2, 4);
            (anh[i], anl[i]) = l_extract(t2);

            // Alpha = Alpha * (1 - K**2)
            t0 = mpy_32(kh, kl, kh, kl);
            t0 = l_abs(t0);
            t0 = l_sub(MAX_32, t0);
            let (hi, lo) = l_extract(t0);
            t0 = mpy_32(alp_h, alp_l, hi, lo);

            let j = norm_l(t0);
            t0 = l_shl(t0, j);
            (alp_h, alp_l) = l_extract(t0);
            alp_exp = add(alp_exp, j);

            ah[1..=i].copy_from_slice(&anh[1..=i]);
            al[1..=i].copy_from_slice(&anl[1..=i]);
        }

        let err = shr(alp_h, alp_exp);

        a[0] = 4096;
        for i in 1..=M {
            let t = l_comp(ah[i], al[i]);
            a[i] = round(l_shl(t, 1));
        }
        self.old_a = *a;
        self.old_rc = [rc[0], rc[1]];

        Some(err)
    }
}
