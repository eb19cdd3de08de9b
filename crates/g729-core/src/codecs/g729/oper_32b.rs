//! Double precision (DPF) operations
//!
//! A 32-bit value is carried as a `hi`/`lo` pair with
//! `L_32 = hi<<16 + lo<<1`, which lets 32x16 and 32x32 products be built
//! out of 16-bit multiplies.

use super::basic_op::*;

/// Split a 32-bit value into DPF `(hi, lo)`
#[inline]
pub fn l_extract(l_32: Word32) -> (Word16, Word16) {
    let hi = extract_h(l_32);
    let lo = extract_l(l_msu(l_shr(l_32, 1), hi, 16384));
    (hi, lo)
}

/// Compose a 32-bit value from DPF `(hi, lo)`
#[inline]
pub fn l_comp(hi: Word16, lo: Word16) -> Word32 {
    l_mac(l_deposit_h(hi), lo, 1)
}

/// 32x32 multiply of two DPF values
#[inline]
pub fn mpy_32(hi1: Word16, lo1: Word16, hi2: Word16, lo2: Word16) -> Word32 {
    let l_32 = l_mult(hi1, hi2);
    let l_32 = l_mac(l_32, mult(hi1, lo2), 1);
    l_mac(l_32, mult(lo1, hi2), 1)
}

/// 32x16 multiply of a DPF value by a 16-bit value
#[inline]
pub fn mpy_32_16(hi: Word16, lo: Word16, n: Word16) -> Word32 {
    let l_32 = l_mult(hi, n);
    l_mac(l_32, mult(lo, n), 1)
}

/// Fractional division of a 32-bit numerator by a DPF denominator
///
/// Requires `0 <= l_num < l_denom`; the result is in Q31.
pub fn div_32(l_num: Word32, denom_hi: Word16, denom_lo: Word16) -> Word32 {
    // 1/L_denom = approx * (2.0 - L_denom * approx)
    let approx = div_s(0x3fff, denom_hi);

    let l_32 = mpy_32_16(denom_hi, denom_lo, approx);
    let l_32 = l_sub(MAX_32, l_32);

    let (hi, lo) = l_extract(l_32);
    let l_32 = mpy_32_16(hi, lo, approx);

    let (hi, lo) = l_extract(l_32);
    let (n_hi, n_lo) = l_extract(l_num);
    let l_32 = mpy_32(n_hi, n_lo, hi, lo);
    l_shl(l_32, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_compose_roundtrip() {
        for &v in &[0, 1, 2, 12345678, -12345678, 0x7fff_fffe, -0x7fff_fffe] {
            let (hi, lo) = l_extract(v);
            let back = l_comp(hi, lo);
            // lo keeps 15 bits, bit 0 is lost
            assert_eq!(back, v & !1);
        }
    }

    #[test]
    fn test_mpy_32_16_half() {
        let (hi, lo) = l_extract(0x4000_0000);
        assert_eq!(mpy_32_16(hi, lo, 16384), 0x2000_0000);
    }

    #[test]
    fn test_div_32() {
        // 0.25 / 0.5 = 0.5 in Q31
        let (hi, lo) = l_extract(0x4000_0000);
        let q = div_32(0x2000_0000, hi, lo);
        assert!((q - 0x4000_0000).abs() < 1 << 16, "got {q:#x}");
    }
}
