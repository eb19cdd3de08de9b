//! G.729 basic operators
//!
//! Saturating 16/32-bit fixed-point primitives with the exact rounding and
//! clipping behaviour of the ITU-T reference arithmetic. The reference keeps a
//! process-wide overflow flag; here the handful of call sites that react to
//! overflow use the `*_o` variants, which raise a caller-owned `bool`
//! whenever saturation happens.

pub type Word16 = i16;
pub type Word32 = i32;

pub const MAX_16: Word16 = 0x7fff;
pub const MIN_16: Word16 = -0x8000;
pub const MAX_32: Word32 = 0x7fff_ffff;
pub const MIN_32: Word32 = -0x8000_0000;

#[inline]
fn saturate(l_var1: Word32) -> Word16 {
    if l_var1 > 0x7fff {
        MAX_16
    } else if l_var1 < -0x8000 {
        MIN_16
    } else {
        l_var1 as Word16
    }
}

#[inline]
fn saturate_o(l_var1: Word32, overflow: &mut bool) -> Word16 {
    if l_var1 > 0x7fff || l_var1 < -0x8000 {
        *overflow = true;
    }
    saturate(l_var1)
}

#[inline]
pub fn add(var1: Word16, var2: Word16) -> Word16 {
    saturate(var1 as Word32 + var2 as Word32)
}

#[inline]
pub fn add_o(var1: Word16, var2: Word16, overflow: &mut bool) -> Word16 {
    saturate_o(var1 as Word32 + var2 as Word32, overflow)
}

#[inline]
pub fn sub(var1: Word16, var2: Word16) -> Word16 {
    saturate(var1 as Word32 - var2 as Word32)
}

#[inline]
pub fn sub_o(var1: Word16, var2: Word16, overflow: &mut bool) -> Word16 {
    saturate_o(var1 as Word32 - var2 as Word32, overflow)
}

#[inline]
pub fn abs_s(var1: Word16) -> Word16 {
    if var1 == MIN_16 { MAX_16 } else { var1.abs() }
}

#[inline]
pub fn negate(var1: Word16) -> Word16 {
    if var1 == MIN_16 { MAX_16 } else { -var1 }
}

pub fn shl(var1: Word16, var2: Word16) -> Word16 {
    if var2 < 0 {
        return shr(var1, var2.saturating_neg());
    }
    if var1 == 0 {
        return 0;
    }
    if var2 > 15 {
        return if var1 > 0 { MAX_16 } else { MIN_16 };
    }
    let result = (var1 as Word32) << var2;
    if result != (result as Word16) as Word32 {
        if var1 > 0 { MAX_16 } else { MIN_16 }
    } else {
        result as Word16
    }
}

pub fn shr(var1: Word16, var2: Word16) -> Word16 {
    if var2 < 0 {
        return shl(var1, var2.saturating_neg());
    }
    if var2 >= 15 {
        if var1 < 0 { -1 } else { 0 }
    } else {
        var1 >> var2
    }
}

/// Shift right with rounding (shift left when `var2` is negative)
pub fn shr_r(var1: Word16, var2: Word16) -> Word16 {
    if var2 > 15 {
        return 0;
    }
    let mut out = shr(var1, var2);
    if var2 > 0 && (var1 & (1 << (var2 - 1))) != 0 {
        out = out.wrapping_add(1);
    }
    out
}

#[inline]
pub fn mult(var1: Word16, var2: Word16) -> Word16 {
    saturate((var1 as Word32 * var2 as Word32) >> 15)
}

#[inline]
pub fn mult_r(var1: Word16, var2: Word16) -> Word16 {
    saturate((var1 as Word32 * var2 as Word32 + 0x4000) >> 15)
}

#[inline]
pub fn l_mult(var1: Word16, var2: Word16) -> Word32 {
    let product = var1 as Word32 * var2 as Word32;
    if product == 0x4000_0000 { MAX_32 } else { product << 1 }
}

#[inline]
pub fn l_mult_o(var1: Word16, var2: Word16, overflow: &mut bool) -> Word32 {
    let product = var1 as Word32 * var2 as Word32;
    if product == 0x4000_0000 {
        *overflow = true;
        MAX_32
    } else {
        product << 1
    }
}

#[inline]
pub fn l_add(l_var1: Word32, l_var2: Word32) -> Word32 {
    l_var1.saturating_add(l_var2)
}

#[inline]
pub fn l_add_o(l_var1: Word32, l_var2: Word32, overflow: &mut bool) -> Word32 {
    match l_var1.checked_add(l_var2) {
        Some(v) => v,
        None => {
            *overflow = true;
            l_var1.saturating_add(l_var2)
        }
    }
}

#[inline]
pub fn l_sub(l_var1: Word32, l_var2: Word32) -> Word32 {
    l_var1.saturating_sub(l_var2)
}

#[inline]
pub fn l_sub_o(l_var1: Word32, l_var2: Word32, overflow: &mut bool) -> Word32 {
    match l_var1.checked_sub(l_var2) {
        Some(v) => v,
        None => {
            *overflow = true;
            l_var1.saturating_sub(l_var2)
        }
    }
}

#[inline]
pub fn l_mac(l_var3: Word32, var1: Word16, var2: Word16) -> Word32 {
    l_add(l_var3, l_mult(var1, var2))
}

#[inline]
pub fn l_mac_o(l_var3: Word32, var1: Word16, var2: Word16, overflow: &mut bool) -> Word32 {
    let product = l_mult_o(var1, var2, overflow);
    l_add_o(l_var3, product, overflow)
}

#[inline]
pub fn l_msu(l_var3: Word32, var1: Word16, var2: Word16) -> Word32 {
    l_sub(l_var3, l_mult(var1, var2))
}

#[inline]
pub fn l_msu_o(l_var3: Word32, var1: Word16, var2: Word16, overflow: &mut bool) -> Word32 {
    let product = l_mult_o(var1, var2, overflow);
    l_sub_o(l_var3, product, overflow)
}

#[inline]
pub fn l_negate(l_var1: Word32) -> Word32 {
    if l_var1 == MIN_32 { MAX_32 } else { -l_var1 }
}

#[inline]
pub fn l_abs(l_var1: Word32) -> Word32 {
    if l_var1 == MIN_32 { MAX_32 } else { l_var1.abs() }
}

pub fn l_shl(l_var1: Word32, var2: Word16) -> Word32 {
    let mut overflow = false;
    l_shl_o(l_var1, var2, &mut overflow)
}

pub fn l_shl_o(l_var1: Word32, var2: Word16, overflow: &mut bool) -> Word32 {
    if var2 <= 0 {
        return l_shr(l_var1, var2.saturating_neg());
    }
    let mut out = l_var1;
    for _ in 0..var2 {
        if out > 0x3fff_ffff {
            *overflow = true;
            return MAX_32;
        }
        if out < -0x4000_0000 {
            *overflow = true;
            return MIN_32;
        }
        out <<= 1;
    }
    out
}

pub fn l_shr(l_var1: Word32, var2: Word16) -> Word32 {
    if var2 < 0 {
        return l_shl(l_var1, var2.saturating_neg());
    }
    if var2 >= 31 {
        if l_var1 < 0 { -1 } else { 0 }
    } else {
        l_var1 >> var2
    }
}

/// 32-bit shift right with rounding (shift left when `var2` is negative)
pub fn l_shr_r(l_var1: Word32, var2: Word16) -> Word32 {
    if var2 > 31 {
        return 0;
    }
    let mut out = l_shr(l_var1, var2);
    if var2 > 0 && (l_var1 & (1 << (var2 - 1))) != 0 {
        out = out.wrapping_add(1);
    }
    out
}

#[inline]
pub fn extract_h(l_var1: Word32) -> Word16 {
    (l_var1 >> 16) as Word16
}

#[inline]
pub fn extract_l(l_var1: Word32) -> Word16 {
    l_var1 as Word16
}

#[inline]
pub fn round(l_var1: Word32) -> Word16 {
    extract_h(l_add(l_var1, 0x0000_8000))
}

#[inline]
pub fn round_o(l_var1: Word32, overflow: &mut bool) -> Word16 {
    extract_h(l_add_o(l_var1, 0x0000_8000, overflow))
}

#[inline]
pub fn l_deposit_h(var1: Word16) -> Word32 {
    (var1 as Word32) << 16
}

#[inline]
pub fn l_deposit_l(var1: Word16) -> Word32 {
    var1 as Word32
}

/// Number of left shifts needed to normalize a 16-bit value
pub fn norm_s(var1: Word16) -> Word16 {
    if var1 == 0 {
        return 0;
    }
    if var1 == -1 {
        return 15;
    }
    let mut v = if var1 < 0 { !var1 } else { var1 };
    let mut n = 0;
    while v < 0x4000 {
        v <<= 1;
        n += 1;
    }
    n
}

/// Number of left shifts needed to normalize a 32-bit value
pub fn norm_l(l_var1: Word32) -> Word16 {
    if l_var1 == 0 {
        return 0;
    }
    if l_var1 == -1 {
        return 31;
    }
    let mut v = if l_var1 < 0 { !l_var1 } else { l_var1 };
    let mut n = 0;
    while v < 0x4000_0000 {
        v <<= 1;
        n += 1;
    }
    n
}

/// Fractional integer division `var1 / var2` in Q15
///
/// Requires `0 <= var1 <= var2` and `var2 > 0`. Out-of-contract inputs are
/// clamped instead of aborting.
pub fn div_s(var1: Word16, var2: Word16) -> Word16 {
    if var2 <= 0 || var1 < 0 {
        return 0;
    }
    if var1 == 0 {
        return 0;
    }
    if var1 >= var2 {
        return MAX_16;
    }
    let mut out: Word16 = 0;
    let mut l_num = var1 as Word32;
    let l_denom = var2 as Word32;
    for _ in 0..15 {
        out <<= 1;
        l_num <<= 1;
        if l_num >= l_denom {
            l_num -= l_denom;
            out += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_add_sub() {
        assert_eq!(add(32000, 1000), MAX_16);
        assert_eq!(sub(-32000, 1000), MIN_16);
        assert_eq!(add(100, -50), 50);
        let mut ovf = false;
        add_o(1, 2, &mut ovf);
        assert!(!ovf);
        add_o(MAX_16, 1, &mut ovf);
        assert!(ovf);
    }

    #[test]
    fn test_mult_family() {
        assert_eq!(mult(16384, 16384), 8192);
        assert_eq!(mult(MIN_16, MIN_16), MAX_16);
        assert_eq!(l_mult(MIN_16, MIN_16), MAX_32);
        assert_eq!(l_mult(2, 3), 12);
        assert_eq!(mult_r(1, 16384), 1);
        assert_eq!(mult(1, 16384), 0);
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(1, 3), 8);
        assert_eq!(shl(0x4000, 1), MAX_16);
        assert_eq!(shl(-0x4001, 1), MIN_16);
        assert_eq!(shr(-1, 20), -1);
        assert_eq!(shr(8, -2), 32);
        assert_eq!(shr_r(3, 1), 2);
        assert_eq!(shr_r(-3, 1), -1);
        assert_eq!(l_shl(0x4000_0000, 1), MAX_32);
        assert_eq!(l_shr(-8, 40), -1);
        assert_eq!(l_shr_r(5, 1), 3);
    }

    #[test]
    fn test_l_shl_overflow_flag() {
        let mut ovf = false;
        assert_eq!(l_shl_o(1, 4, &mut ovf), 16);
        assert!(!ovf);
        assert_eq!(l_shl_o(-0x4000_0001, 1, &mut ovf), MIN_32);
        assert!(ovf);
    }

    #[test]
    fn test_round_and_extract() {
        assert_eq!(round(0x0001_8000), 2);
        assert_eq!(round(0x0001_7fff), 1);
        assert_eq!(round(MAX_32), MAX_16);
        assert_eq!(extract_l(0x0001_ffff), -1);
        assert_eq!(extract_h(-0x0001_0000), -1);
    }

    #[test]
    fn test_norm() {
        assert_eq!(norm_s(0x4000), 0);
        assert_eq!(norm_s(1), 14);
        assert_eq!(norm_s(-1), 15);
        assert_eq!(norm_l(1), 30);
        assert_eq!(norm_l(-0x4000_0000), 1);
        assert_eq!(norm_l(i32::MIN), 0);
        assert_eq!(norm_l(-1), 31);
        assert_eq!(norm_l(0), 0);
    }

    #[test]
    fn test_div_s() {
        assert_eq!(div_s(1, 2), 16384);
        assert_eq!(div_s(3, 3), MAX_16);
        assert_eq!(div_s(0, 7), 0);
        assert_eq!(div_s(1, 4), 8192);
    }

    #[test]
    fn test_l_mac_overflow_tracking() {
        let mut ovf = false;
        let acc = l_mac_o(MAX_32 - 1, 1, 1, &mut ovf);
        assert_eq!(acc, MAX_32);
        assert!(ovf);

        let mut ovf = false;
        let acc = l_msu_o(0, 100, 100, &mut ovf);
        assert_eq!(acc, -20000);
        assert!(!ovf);
    }
}
