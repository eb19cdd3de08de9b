//! Table-driven transcendental helpers: 2^x, log2(x) and 1/sqrt(x)

use super::basic_op::*;

/// 2^x table, Q15 mantissa
const TABPOW: [Word16; 33] = [
    16384, 16743, 17109, 17484, 17867, 18258, 18658, 19066, 19484, 19911, 20347, 20792, 21247,
    21713, 22188, 22674, 23170, 23678, 24196, 24726, 25268, 25821, 26386, 26964, 27554, 28158,
    28774, 29405, 30048, 30706, 31379, 32066, 32767,
];

/// log2(x) table for x in [1, 2)
const TABLOG: [Word16; 33] = [
    0, 1455, 2866, 4236, 5568, 6863, 8124, 9352, 10549, 11716, 12855, 13967, 15054, 16117, 17156,
    18172, 19167, 20142, 21097, 22033, 22951, 23852, 24735, 25603, 26455, 27291, 28113, 28922,
    29716, 30497, 31266, 32023, 32767,
];

/// 1/sqrt(x) table for x in [0.25, 1)
const TABSQR: [Word16; 49] = [
    32767, 31790, 30894, 30070, 29309, 28602, 27945, 27330, 26755, 26214, 25705, 25225, 24770,
    24339, 23930, 23541, 23170, 22817, 22479, 22155, 21845, 21548, 21263, 20988, 20724, 20470,
    20225, 19988, 19760, 19539, 19326, 19119, 18919, 18725, 18536, 18354, 18176, 18004, 17837,
    17674, 17515, 17361, 17211, 17064, 16921, 16782, 16646, 16514, 16384,
];

/// `2^(exponent.fraction)` with `fraction` in Q15, result as a 32-bit integer
pub fn pow2(exponent: Word16, fraction: Word16) -> Word32 {
    let l_x = l_mult(fraction, 32);
    let i = extract_h(l_x) as usize;
    let l_x = l_shr(l_x, 1);
    let a = extract_l(l_x) & 0x7fff;

    let l_x = l_deposit_h(TABPOW[i]);
    let tmp = sub(TABPOW[i], TABPOW[i + 1]);
    let l_x = l_msu(l_x, tmp, a);

    let exp = sub(30, exponent);
    l_shr_r(l_x, exp)
}

/// `log2(l_x)` split into integer `exponent` and Q15 `fraction`
///
/// Non-positive inputs yield `(0, 0)`.
pub fn log2(l_x: Word32) -> (Word16, Word16) {
    if l_x <= 0 {
        return (0, 0);
    }

    let exp = norm_l(l_x);
    let l_x = l_shl(l_x, exp);
    let exponent = sub(30, exp);

    let l_x = l_shr(l_x, 9);
    let i = extract_h(l_x);
    let l_x = l_shr(l_x, 1);
    let a = extract_l(l_x) & 0x7fff;

    let i = (i - 32) as usize;
    let l_y = l_deposit_h(TABLOG[i]);
    let tmp = sub(TABLOG[i], TABLOG[i + 1]);
    let l_y = l_msu(l_y, tmp, a);

    (exponent, extract_h(l_y))
}

/// `1/sqrt(l_x)` for positive `l_x`, result in Q30
pub fn inv_sqrt(l_x: Word32) -> Word32 {
    if l_x <= 0 {
        return 0x3fff_ffff;
    }

    let exp = norm_l(l_x);
    let mut l_x = l_shl(l_x, exp);
    let mut exp = sub(30, exp);
    if (exp & 1) == 0 {
        l_x = l_shr(l_x, 1);
    }
    exp = shr(exp, 1);
    exp = add(exp, 1);

    let l_x = l_shr(l_x, 9);
    let i = extract_h(l_x);
    let l_x = l_shr(l_x, 1);
    let a = extract_l(l_x) & 0x7fff;

    let i = (i - 16) as usize;
    let l_y = l_deposit_h(TABSQR[i]);
    let tmp = sub(TABSQR[i], TABSQR[i + 1]);
    let l_y = l_msu(l_y, tmp, a);

    l_shr(l_y, exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow2_integer_exponents() {
        assert_eq!(pow2(0, 0), 1);
        assert_eq!(pow2(10, 0), 1024);
        assert_eq!(pow2(14, 0), 16384);
    }

    #[test]
    fn test_pow2_half() {
        // 2^10.5 = 1448.15
        let v = pow2(10, 16384);
        assert!((v - 1448).abs() <= 1, "got {v}");
    }

    #[test]
    fn test_log2_powers_of_two() {
        assert_eq!(log2(1), (0, 0));
        assert_eq!(log2(1024), (10, 0));
        assert_eq!(log2(0), (0, 0));
        assert_eq!(log2(-5), (0, 0));
    }

    #[test]
    fn test_log2_fraction() {
        // log2(3) = 1.58496
        let (e, f) = log2(3);
        assert_eq!(e, 1);
        let expected = (0.58496_f64 * 32768.0) as i32;
        assert!((f as i32 - expected).abs() < 40, "got {f}");
    }

    #[test]
    fn test_inv_sqrt() {
        for &x in &[4i32, 1000, 0x2000_0000, 0x7fff_ffff] {
            let v = inv_sqrt(x);
            let expected = (1u64 << 30) as f64 / (x as f64).sqrt();
            assert!((v as f64 - expected).abs() / expected < 0.01, "x={x} got {v}");
        }
        assert_eq!(inv_sqrt(0), 0x3fff_ffff);
    }
}
