//! Conversions between LP coefficients, LSPs and LSFs

use super::basic_op::*;
use super::constants::{GRID_POINTS, M, MP1, NC};
use super::oper_32b::{l_extract, mpy_32_16};
use super::tables::{GRID, SLOPE, SLOPE_ACOS, SLOPE_COS, TABLE, TABLE2};
use tracing::warn;

/// Chebyshev evaluation of `C(x) = T5(x) + f(1)T4(x) + ... + f(5)/2`
/// with the polynomial in Q11, or in Q10 when `q10` is set. Result in Q14.
fn chebps(x: Word16, f: &[Word16; NC + 1], q10: bool) -> Word16 {
    // b2 = 1.0 and 2*x, in Q24 (Q23 for the Q10 path)
    let (b2_one, two_x, f_mul, out_shift) = if q10 {
        (128, 256, 4096, 7)
    } else {
        (256, 512, 4096, 6)
    };

    let mut b2_h: Word16 = b2_one;
    let mut b2_l: Word16 = 0;

    let t0 = l_mult(x, two_x);
    let t0 = l_mac(t0, f[1], f_mul);
    let (mut b1_h, mut b1_l) = l_extract(t0);

    for &fi in &f[2..NC] {
        let mut t0 = mpy_32_16(b1_h, b1_l, x);
        t0 = l_shl(t0, 1);
        t0 = l_mac(t0, b2_h, -32768);
        t0 = l_msu(t0, b2_l, 1);
        t0 = l_mac(t0, fi, f_mul);
        let (b0_h, b0_l) = l_extract(t0);

        b2_l = b1_l;
        b2_h = b1_h;
        b1_l = b0_l;
        b1_h = b0_h;
    }

    let mut t0 = mpy_32_16(b1_h, b1_l, x);
    t0 = l_mac(t0, b2_h, -32768);
    t0 = l_msu(t0, b2_l, 1);
    t0 = l_mac(t0, f[NC], f_mul >> 1);

    t0 = l_shl(t0, out_shift);
    extract_h(t0)
}

/// Build the sum and difference polynomials of `A(z)`
///
/// Returns `true` when the Q11 representation saturated and the
/// polynomials were rebuilt in Q10.
fn lsp_polynomials(a: &[Word16], f1: &mut [Word16; NC + 1], f2: &mut [Word16; NC + 1]) -> bool {
    let mut ovf_coef = false;

    f1[0] = 2048;
    f2[0] = 2048;
    for i in 0..NC {
        let t0 = l_mult(a[i + 1], 16384);
        let t0 = l_mac_o(t0, a[M - i], 16384, &mut ovf_coef);
        let x = extract_h(t0);
        f1[i + 1] = sub_o(x, f1[i], &mut ovf_coef);

        let t0 = l_mult(a[i + 1], 16384);
        let t0 = l_msu_o(t0, a[M - i], 16384, &mut ovf_coef);
        let x = extract_h(t0);
        f2[i + 1] = add_o(x, f2[i], &mut ovf_coef);
    }

    if ovf_coef {
        f1[0] = 1024;
        f2[0] = 1024;
        for i in 0..NC {
            let t0 = l_mult(a[i + 1], 8192);
            let t0 = l_mac(t0, a[M - i], 8192);
            f1[i + 1] = sub(extract_h(t0), f1[i]);

            let t0 = l_mult(a[i + 1], 8192);
            let t0 = l_msu(t0, a[M - i], 8192);
            f2[i + 1] = add(extract_h(t0), f2[i]);
        }
    }

    ovf_coef
}

/// LP coefficients to LSPs (cosine domain, Q15)
///
/// The roots of the sum and difference polynomials are searched on a
/// 50-interval cosine grid, refined by two bisections and one linear
/// interpolation. When fewer than ten roots are found the previous frame's
/// LSPs are returned unchanged.
///
/// # Arguments
/// * `a` - LP coefficients in Q12
/// * `lsp` - Output LSPs in Q15
/// * `old_lsp` - LSPs of the previous frame
///
/// Returns `false` when the previous LSPs were substituted.
pub fn az_lsp(a: &[Word16; MP1], lsp: &mut [Word16; M], old_lsp: &[Word16; M]) -> bool {
    let mut f1 = [0; NC + 1];
    let mut f2 = [0; NC + 1];
    let q10 = lsp_polynomials(a, &mut f1, &mut f2);

    let mut nf = 0;
    let mut use_f2 = false;

    let mut xlow = GRID[0];
    let mut ylow = chebps(xlow, &f1, q10);

    let mut j = 0;
    while nf < M && j < GRID_POINTS {
        j += 1;
        let coef = if use_f2 { &f2 } else { &f1 };
        let mut xhigh = xlow;
        let mut yhigh = ylow;
        xlow = GRID[j];
        ylow = chebps(xlow, coef, q10);

        if l_mult(ylow, yhigh) <= 0 {
            // divide the interval twice
            for _ in 0..2 {
                let xmid = add(shr(xlow, 1), shr(xhigh, 1));
                let ymid = chebps(xmid, coef, q10);
                if l_mult(ylow, ymid) <= 0 {
                    yhigh = ymid;
                    xhigh = xmid;
                } else {
                    ylow = ymid;
                    xlow = xmid;
                }
            }

            // xint = xlow - ylow*(xhigh-xlow)/(yhigh-ylow)
            let x = sub(xhigh, xlow);
            let mut y = sub(yhigh, ylow);
            let xint = if y == 0 {
                xlow
            } else {
                let sign = y;
                y = abs_s(y);
                let exp = norm_s(y);
                y = shl(y, exp);
                y = div_s(16383, y);
                let t0 = l_mult(x, y);
                let t0 = l_shr(t0, sub(20, exp));
                y = extract_l(t0);
                if sign < 0 {
                    y = negate(y);
                }
                let t0 = l_mult(ylow, y);
                let t0 = l_shr(t0, 11);
                sub(xlow, extract_l(t0))
            };

            lsp[nf] = xint;
            xlow = xint;
            nf += 1;

            use_f2 = !use_f2;
            let coef = if use_f2 { &f2 } else { &f1 };
            ylow = chebps(xlow, coef, q10);
        }
    }

    if nf < M {
        warn!("LP to LSP conversion found {} roots, keeping previous LSPs", nf);
        *lsp = *old_lsp;
        return false;
    }
    true
}

/// Coefficients of `F(z)` from every other LSP, Q24
fn get_lsp_pol(lsp: &[Word16], f: &mut [Word32; NC + 1]) {
    f[0] = l_mult(4096, 2048);
    f[1] = l_msu(0, lsp[0], 512);

    for i in 2..=NC {
        let l = lsp[2 * (i - 1)];
        f[i] = f[i - 2];
        for j in (2..=i).rev() {
            let (hi, lo) = l_extract(f[j - 1]);
            let t0 = l_shl(mpy_32_16(hi, lo, l), 1);
            f[j] = l_add(f[j], f[j - 2]);
            f[j] = l_sub(f[j], t0);
        }
        f[1] = l_msu(f[1], l, 512);
    }
}

/// LSPs (Q15) to LP coefficients (Q12)
pub fn lsp_az(lsp: &[Word16; M], a: &mut [Word16]) {
    let mut f1 = [0; NC + 1];
    let mut f2 = [0; NC + 1];
    get_lsp_pol(&lsp[0..], &mut f1);
    get_lsp_pol(&lsp[1..], &mut f2);

    for i in (1..=NC).rev() {
        f1[i] = l_add(f1[i], f1[i - 1]);
        f2[i] = l_sub(f2[i], f2[i - 1]);
    }

    a[0] = 4096;
    for i in 1..=NC {
        let j = M + 1 - i;
        let t0 = l_add(f1[i], f2[i]);
        a[i] = extract_l(l_shr_r(t0, 13));
        let t0 = l_sub(f1[i], f2[i]);
        a[j] = extract_l(l_shr_r(t0, 13));
    }
}

/// LSPs to normalized LSFs (Q15, range `[0, 0.5)`)
pub fn lsp_lsf(lsp: &[Word16; M], lsf: &mut [Word16; M]) {
    let mut ind: usize = 63;
    for i in (0..M).rev() {
        while ind > 0 && TABLE[ind] < lsp[i] {
            ind -= 1;
        }
        let l_tmp = l_mult(sub(lsp[i], TABLE[ind]), SLOPE[ind]);
        let tmp = round(l_shl(l_tmp, 3));
        lsf[i] = add(tmp, shl(ind as Word16, 8));
    }
}

/// Normalized LSFs (Q15) to LSPs
#[cfg(test)]
pub fn lsf_lsp(lsf: &[Word16; M], lsp: &mut [Word16; M]) {
    for i in 0..M {
        let ind = shr(lsf[i], 8).clamp(0, 63) as usize;
        let offset = lsf[i] & 0x00ff;
        let l_tmp = l_mult(sub(TABLE[ind + 1], TABLE[ind]), offset);
        lsp[i] = add(TABLE[ind], extract_l(l_shr(l_tmp, 9)));
    }
}

/// LSPs to LSFs in radians (Q13, range `[0, pi)`)
pub fn lsp_lsf2(lsp: &[Word16; M], lsf: &mut [Word16; M]) {
    let mut ind: usize = 63;
    for i in (0..M).rev() {
        while ind > 0 && TABLE2[ind] < lsp[i] {
            ind -= 1;
        }
        let offset = sub(lsp[i], TABLE2[ind]);
        let l_tmp = l_mult(SLOPE_ACOS[ind], offset);
        let freq = add(shl(ind as Word16, 9), extract_l(l_shr(l_tmp, 12)));
        lsf[i] = mult(freq, 25736);
    }
}

/// LSFs in radians (Q13) to LSPs (Q15)
pub fn lsf_lsp2(lsf: &[Word16; M], lsp: &mut [Word16; M]) {
    for i in 0..M {
        let freq = mult(lsf[i], 20861);
        let ind = shr(freq, 8).clamp(0, 63) as usize;
        let offset = freq & 0x00ff;
        let l_tmp = l_mult(SLOPE_COS[ind], offset);
        lsp[i] = add(TABLE2[ind], extract_l(l_shr(l_tmp, 13)));
    }
}

/// Interpolated LP filters of both subframes
///
/// Subframe 1 uses the mean of the previous and current LSPs, subframe 2
/// the current LSPs.
pub fn int_qlpc(lsp_old: &[Word16; M], lsp_new: &[Word16; M], az: &mut [Word16; 2 * MP1]) {
    let mut lsp = [0; M];
    for i in 0..M {
        lsp[i] = add(shr(lsp_new[i], 1), shr(lsp_old[i], 1));
    }
    lsp_az(&lsp, &mut az[..MP1]);
    lsp_az(lsp_new, &mut az[MP1..]);
}

/// Bandwidth expansion `ap[i] = a[i] * gamma^i`
pub fn weight_az(a: &[Word16], gamma: Word16, ap: &mut [Word16]) {
    ap[0] = a[0];
    let mut fac = gamma;
    for i in 1..M {
        ap[i] = round(l_mult(a[i], fac));
        fac = round(l_mult(fac, gamma));
    }
    ap[M] = round(l_mult(a[M], fac));
}
