//! Correlations shared by the codebook searches and the gain quantizer

use super::basic_op::*;
use super::constants::L_SUBFR;

/// `sum(x[i] * y[i])` with saturation
#[inline]
pub fn dot_product(x: &[Word16], y: &[Word16]) -> Word32 {
    x.iter().zip(y).fold(0, |s, (&a, &b)| l_mac(s, a, b))
}

/// Backward filtered target `d[n] = sum(x[i] * h[i-n])`
///
/// The result is normalized so that its largest magnitude fits in 13 bits.
pub fn cor_h_x(h: &[Word16], x: &[Word16], d: &mut [Word16; L_SUBFR]) {
    let mut y32 = [0; L_SUBFR];
    let mut max = 0;

    for i in 0..L_SUBFR {
        let mut s = 0;
        for j in i..L_SUBFR {
            s = l_mac(s, x[j], h[j - i]);
        }
        y32[i] = s;
        let s = l_abs(s);
        if l_sub(s, max) > 0 {
            max = s;
        }
    }

    let mut j = norm_l(max);
    if j > 16 {
        j = 16;
    }
    let j = sub(18, j);

    for i in 0..L_SUBFR {
        d[i] = extract_l(l_shr(y32[i], j));
    }
}

/// Correlations involving the filtered fixed codebook vector
///
/// Fills entries 2..5 of `g_coeff`/`exp_g_coeff` with `<y2,y2>`,
/// `-2<xn,y2>` and `2<y1,y2>`; entries 0 and 1 come from the pitch gain.
pub fn corr_xy2(
    xn: &[Word16],
    y1: &[Word16],
    y2: &[Word16],
    g_coeff: &mut [Word16; 5],
    exp_g_coeff: &mut [Word16; 5],
) {
    let mut scaled_y2 = [0; L_SUBFR];
    for i in 0..L_SUBFR {
        scaled_y2[i] = shr(y2[i], 3);
    }

    let mut l_acc = 1;
    for &v in scaled_y2.iter() {
        l_acc = l_mac(l_acc, v, v);
    }
    let exp = norm_l(l_acc);
    g_coeff[2] = round(l_shl(l_acc, exp));
    exp_g_coeff[2] = add(exp, 19 - 16);

    let mut l_acc = 1;
    for i in 0..L_SUBFR {
        l_acc = l_mac(l_acc, xn[i], scaled_y2[i]);
    }
    let exp = norm_l(l_acc);
    g_coeff[3] = negate(round(l_shl(l_acc, exp)));
    exp_g_coeff[3] = sub(add(exp, 10 - 16), 1);

    let mut l_acc = 1;
    for i in 0..L_SUBFR {
        l_acc = l_mac(l_acc, y1[i], scaled_y2[i]);
    }
    let exp = norm_l(l_acc);
    g_coeff[4] = round(l_shl(l_acc, exp));
    exp_g_coeff[4] = sub(add(exp, 10 - 16), 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cor_h_x_unit_impulse_is_scaled_copy() {
        let mut h = [0; L_SUBFR];
        h[0] = 4096;
        let x: Vec<Word16> = (0..L_SUBFR as i16).map(|i| (i - 20) * 50).collect();
        let mut d = [0; L_SUBFR];
        cor_h_x(&h, &x, &mut d);
        let peak = d.iter().map(|v| v.abs()).max().unwrap_or(0);
        assert!((4096..8192).contains(&peak), "peak {peak}");
        // proportional to the input
        assert_eq!(d[20], 0);
        assert!(d[0] < 0 && d[39] > 0);
    }

    #[test]
    fn test_corr_xy2_signs() {
        let xn = [1000; L_SUBFR];
        let y1 = [500; L_SUBFR];
        let y2 = [4096; L_SUBFR];
        let mut g = [0; 5];
        let mut e = [0; 5];
        corr_xy2(&xn, &y1, &y2, &mut g, &mut e);
        assert!(g[2] > 0);
        assert!(g[3] < 0);
        assert!(g[4] > 0);
    }
}
