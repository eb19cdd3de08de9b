//! Fixed-point filters shared by the encoder and decoder
//!
//! High-pass pre/post filters, LP synthesis and inverse filtering, and
//! the truncated convolution used by the codebook searches.

use super::basic_op::*;
use super::constants::M;
use super::oper_32b::{l_extract, mpy_32_16};

/// Second order IIR section with a double precision feedback path
#[derive(Debug, Clone, Default)]
struct Biquad {
    x0: Word16,
    x1: Word16,
    y1_hi: Word16,
    y1_lo: Word16,
    y2_hi: Word16,
    y2_lo: Word16,
}

impl Biquad {
    /// One output sample in Q31, coefficients scaled down by `2^shift`
    #[inline]
    fn step(&mut self, x: Word16, b: &[Word16; 3], a: &[Word16; 3], shift: Word16) -> Word32 {
        let x2 = self.x1;
        self.x1 = self.x0;
        self.x0 = x;

        let mut l_tmp = mpy_32_16(self.y1_hi, self.y1_lo, a[1]);
        l_tmp = l_add(l_tmp, mpy_32_16(self.y2_hi, self.y2_lo, a[2]));
        l_tmp = l_mac(l_tmp, self.x0, b[0]);
        l_tmp = l_mac(l_tmp, self.x1, b[1]);
        l_tmp = l_mac(l_tmp, x2, b[2]);
        l_tmp = l_shl(l_tmp, shift);

        self.y2_hi = self.y1_hi;
        self.y2_lo = self.y1_lo;
        (self.y1_hi, self.y1_lo) = l_extract(l_tmp);
        l_tmp
    }
}

/// Encoder input filter: 140 Hz high-pass with the input divided by two
#[derive(Debug, Clone, Default)]
pub struct PreProcess {
    state: Biquad,
}

impl PreProcess {
    /// b/2 in Q12
    const B140: [Word16; 3] = [1899, -3798, 1899];
    /// a in Q12
    const A140: [Word16; 3] = [4096, 7807, -3733];

    pub fn new() -> Self {
        Self::default()
    }

    /// Filter a block in place
    pub fn process(&mut self, signal: &mut [Word16]) {
        for s in signal.iter_mut() {
            let l_tmp = self.state.step(*s, &Self::B140, &Self::A140, 3);
            *s = round(l_tmp);
        }
    }
}

/// Decoder output filter: 100 Hz high-pass followed by a gain of two
#[derive(Debug, Clone, Default)]
pub struct PostProcess {
    state: Biquad,
}

impl PostProcess {
    /// Q13
    const B100: [Word16; 3] = [7699, -15398, 7699];
    /// Q13
    const A100: [Word16; 3] = [8192, 15836, -7667];

    pub fn new() -> Self {
        Self::default()
    }

    /// Filter a block in place, saturating the doubled output
    pub fn process(&mut self, signal: &mut [Word16]) {
        for s in signal.iter_mut() {
            let l_tmp = self.state.step(*s, &Self::B100, &Self::A100, 2);
            *s = round(l_shl(l_tmp, 1));
        }
    }
}

/// LP synthesis filter `1/A(z)`
///
/// # Arguments
/// * `a` - LP coefficients in Q12 (`M + 1` entries)
/// * `x` - Excitation
/// * `y` - Output speech, same length as `x`
/// * `mem` - Filter memory, oldest first
/// * `update` - Store the last `M` outputs into `mem`
///
/// Returns `true` if any accumulation saturated.
pub fn syn_filt(
    a: &[Word16],
    x: &[Word16],
    y: &mut [Word16],
    mem: &mut [Word16; M],
    update: bool,
) -> bool {
    let lg = x.len();
    let mut overflow = false;
    let mut tmp = vec![0; lg + M];
    tmp[..M].copy_from_slice(mem);

    for i in 0..lg {
        let mut s = l_mult_o(x[i], a[0], &mut overflow);
        for j in 1..=M {
            s = l_msu_o(s, a[j], tmp[M + i - j], &mut overflow);
        }
        s = l_shl_o(s, 3, &mut overflow);
        tmp[M + i] = round_o(s, &mut overflow);
    }

    y[..lg].copy_from_slice(&tmp[M..]);
    if update {
        mem.copy_from_slice(&y[lg - M..lg]);
    }
    overflow
}

/// LP inverse filter `A(z)`
///
/// `x` carries `M` samples of history before the `y.len()` samples to filter.
pub fn residu(a: &[Word16], x: &[Word16], y: &mut [Word16]) {
    for (i, out) in y.iter_mut().enumerate() {
        let mut s = l_mult(x[M + i], a[0]);
        for j in 1..=M {
            s = l_mac(s, a[j], x[M + i - j]);
        }
        s = l_shl(s, 3);
        *out = round(s);
    }
}
