//! Comfort noise generation
//!
//! During inactive frames both sides build the excitation from a random
//! adaptive codebook contribution, gaussian noise and four random pulses,
//! scaled so the frame energy follows the SID gain. The encoder runs the
//! same generator to keep its filter memories aligned with the decoder.

use super::basic_op::*;
use super::constants::{A_GAIN0, A_GAIN1, FRAC1, G_MAX, K0, L_FRAME, L_SUBFR, M, MP1};
use super::dspfunc::{inv_sqrt, log2};
use super::lsp::int_qlpc;
use super::lsp_quant::FreqPrev;
use super::oper_32b::{l_extract, mpy_32_16};
use super::pitch::pred_lt_3;
use super::sid_lsf::sid_lsfq_decode;
use super::tables_dtx::{FACT, LSP_SID_RESET, MARG, TAB_SIDGAIN};
use super::taming::ExcErrTracker;
use tracing::trace;

/// Linear congruential generator `seed = seed * 31821 + 13849`
pub fn random(seed: &mut Word16) -> Word16 {
    *seed = extract_l(l_add(l_shr(l_mult(*seed, 31821), 1), 13849));
    *seed
}

/// Approximately gaussian sample from the sum of 12 uniform draws
fn gauss(seed: &mut Word16) -> Word16 {
    let mut l_acc: Word32 = 0;
    for _ in 0..12 {
        l_acc = l_add(l_acc, l_deposit_l(random(seed)));
    }
    extract_l(l_shr(l_acc, 7))
}

/// Bitwise square root of a Q31 value, Q15 result
fn sqrt_q15(num: Word32) -> Word16 {
    let mut rez: Word16 = 0;
    let mut exp: Word16 = 0x4000;
    for _ in 0..14 {
        let t = add(rez, exp);
        if l_sub(num, l_mult(t, t)) >= 0 {
            rez = t;
        }
        exp = shr(exp, 1);
    }
    rez
}

/// Random parameters of one comfort noise subframe
struct RandomSubframe {
    t0: Word16,
    frac: Word16,
    pos: [usize; 4],
    sign: [bool; 4],
    gp: Word16,
}

impl RandomSubframe {
    fn draw(seed: &mut Word16) -> Self {
        let mut temp1 = random(seed);
        let mut frac = sub(temp1 & 0x0003, 1);
        if frac == 2 {
            frac = 0;
        }
        temp1 = shr(temp1, 2);
        let t0 = add(temp1 & 0x003f, 40);
        temp1 = shr(temp1, 6);
        let mut pos = [0usize; 4];
        let mut sign = [false; 4];
        pos[0] = 5 * (temp1 & 0x0007) as usize;
        temp1 = shr(temp1, 3);
        sign[0] = temp1 & 1 != 0;
        temp1 = shr(temp1, 1);
        pos[1] = 5 * (temp1 & 0x0007) as usize + 1;
        temp1 = shr(temp1, 3);
        sign[1] = temp1 & 1 != 0;

        let mut temp1 = random(seed);
        pos[2] = 5 * (temp1 & 0x0007) as usize + 2;
        temp1 = shr(temp1, 3);
        sign[2] = temp1 & 1 != 0;
        temp1 = shr(temp1, 1);
        let temp2 = temp1 & 0x000f;
        pos[3] = (temp2 & 1) as usize + 3 + 5 * (shr(temp2, 1) & 7) as usize;
        temp1 = shr(temp1, 4);
        sign[3] = temp1 & 1 != 0;

        // below 0.5 in Q14
        let gp = random(seed) & 0x1fff;

        Self {
            t0,
            frac,
            pos,
            sign,
            gp,
        }
    }

    /// Signed sum of `x` at the pulse positions, each shifted right by `sh`
    fn pulse_sum(&self, x: &[Word16], sh: Word16) -> Word16 {
        let mut acc = 0;
        for (&p, &s) in self.pos.iter().zip(self.sign.iter()) {
            let v = shr(x[p], sh);
            acc = if s { add(acc, v) } else { sub(acc, v) };
        }
        acc
    }
}

/// Generate one frame of comfort noise excitation
///
/// # Arguments
/// * `cur_gain` - Target excitation gain
/// * `exc` - Excitation buffer; `exc[pos..pos + L_FRAME]` is written and
///   the samples before `pos` serve as adaptive codebook history
/// * `seed` - Random generator state
/// * `taming` - Encoder side error tracker, fed with the random pitch gains
pub fn calc_exc_rand(
    cur_gain: Word16,
    exc: &mut [Word16],
    pos: usize,
    seed: &mut Word16,
    mut taming: Option<&mut ExcErrTracker>,
) {
    if cur_gain == 0 {
        exc[pos..pos + L_FRAME].fill(0);
        if let Some(tracker) = taming.as_deref_mut() {
            for _ in (0..L_FRAME).step_by(L_SUBFR) {
                tracker.update(0, L_SUBFR as Word16 + 1);
            }
        }
        return;
    }

    for i_subfr in (0..L_FRAME).step_by(L_SUBFR) {
        let start = pos + i_subfr;
        let rnd = RandomSubframe::draw(seed);
        let mut gp = rnd.gp;
        let gp2 = shl(gp, 1);

        // gaussian excitation
        let mut excg = [0; L_SUBFR];
        let mut l_acc: Word32 = 0;
        for v in excg.iter_mut() {
            let g = gauss(seed);
            l_acc = l_mac(l_acc, g, g);
            *v = g;
        }

        // fact = 0.5 * cur_gain * sqrt(L_SUBFR / energy)
        let l_acc = inv_sqrt(l_shr(l_acc, 1));
        let (hi, lo) = l_extract(l_acc);
        let temp1 = add(cur_gain, mult_r(cur_gain, FRAC1));
        let l_acc = mpy_32_16(hi, lo, temp1);
        let sh = norm_l(l_acc);
        let temp1 = extract_h(l_shl(l_acc, sh));
        let sh = sub(sh, 14);
        for v in excg.iter_mut() {
            *v = shr_r(mult_r(*v, temp1), sh);
        }

        pred_lt_3(exc, start, rnd.t0, rnd.frac, L_SUBFR);

        let cur_exc = &mut exc[start..start + L_SUBFR];
        let mut max = 0;
        for (c, &g) in cur_exc.iter_mut().zip(excg.iter()) {
            *c = add(mult_r(*c, gp2), g);
            let a = abs_s(*c);
            if a > max {
                max = a;
            }
        }

        let mut sh = if max == 0 {
            0
        } else {
            sub(3, norm_s(max)).max(0)
        };
        let mut excs = [0; L_SUBFR];
        for (s, &c) in excs.iter_mut().zip(cur_exc.iter()) {
            *s = shr(c, sh);
        }

        // fixed codebook gain: root of 4x^2 + 2bx + c
        let mut l_ener: Word32 = 0;
        for &s in excs.iter() {
            l_ener = l_mac(l_ener, s, s);
        }
        let mut inter_exc = rnd.pulse_sum(&excs, 0);

        // k = cur_gain^2 * L_SUBFR
        let temp1 = extract_l(l_shr(l_mult(cur_gain, L_SUBFR as Word16), 6));
        let l_k = l_mult(cur_gain, temp1);
        let mut l_acc = l_shr(l_k, add(1, shl(sh, 1)));

        // delta = b^2 - 4c
        l_acc = l_sub(l_acc, l_ener);
        inter_exc = shr(inter_exc, 1);
        l_acc = l_mac(l_acc, inter_exc, inter_exc);
        sh = add(sh, 1);

        if l_acc < 0 {
            // no real root: drop the adaptive part
            cur_exc.copy_from_slice(&excg);
            let mut bits = 0;
            for &p in rnd.pos.iter() {
                bits |= abs_s(excg[p]);
            }
            sh = if bits & 0x4000 == 0 { 1 } else { 2 };
            inter_exc = rnd.pulse_sum(&excg, sh);
            let (hi, lo) = l_extract(l_k);
            l_acc = mpy_32_16(hi, lo, K0);
            l_acc = l_shr(l_acc, sub(shl(sh, 1), 1));
            l_acc = l_mac(l_acc, inter_exc, inter_exc);
            gp = 0;
        }

        let temp2 = sqrt_q15(l_acc);
        let mut x1 = sub(temp2, inter_exc);
        let x2 = negate(add(inter_exc, temp2));
        if abs_s(x2) < abs_s(x1) {
            x1 = x2;
        }
        let g = shr_r(x1, sub(2, sh)).clamp(negate(G_MAX), G_MAX);

        for (&p, &s) in rnd.pos.iter().zip(rnd.sign.iter()) {
            cur_exc[p] = if s { add(cur_exc[p], g) } else { sub(cur_exc[p], g) };
        }

        if let Some(tracker) = taming.as_deref_mut() {
            tracker.update(gp, rnd.t0);
        }
    }
}

/// Map an energy `l_x * 2^-sh` to a SID gain index and its level in dB
pub(crate) fn quant_energy(l_x: Word32, sh: Word16) -> (Word16, Word16) {
    let (exp, frac) = log2(l_x);
    let mut e_tmp = shl(sub(exp, sh), 10);
    e_tmp = add(e_tmp, mult_r(frac, 1024));

    // -8 dB
    if sub(e_tmp, -2721) <= 0 {
        return (0, -12);
    }
    // 65 dB
    if sub(e_tmp, 22111) > 0 {
        return (31, 66);
    }
    // 14 dB: 4 dB steps below, 2 dB above
    if sub(e_tmp, 4762) <= 0 {
        let index = mult(add(e_tmp, 3401), 24).max(1);
        return (index, sub(shl(index, 2), 8));
    }
    let index = sub(shr(mult(sub(e_tmp, 340), 193), 2), 1).max(6);
    (index, add(shl(index, 1), 4))
}

/// Quantize the averaged energy of the last `nb_ener` frames
///
/// With `nb_ener == 0` only `ener[0]` is used; the decoder uses this to
/// rebuild the gain of an erased first SID frame.
///
/// Returns the gain index and the quantized level in dB.
pub(crate) fn qua_sidgain(ener: &[Word16], sh_ener: &[Word16], nb_ener: usize) -> (Word16, Word16) {
    let (l_x, sh1) = if nb_ener == 0 {
        let l_acc = l_shl(l_deposit_l(ener[0]), sh_ener[0]);
        let (hi, lo) = l_extract(l_acc);
        (mpy_32_16(hi, lo, FACT[0]), 0)
    } else {
        let sh_min = sh_ener[..nb_ener].iter().copied().min().unwrap_or(0);
        let sh1 = add(sh_min, 16 - MARG[nb_ener]);
        let mut l_x: Word32 = 0;
        for i in 0..nb_ener {
            let l_acc = l_shl(l_deposit_l(ener[i]), sub(sh1, sh_ener[i]));
            l_x = l_add(l_x, l_acc);
        }
        let (hi, lo) = l_extract(l_x);
        (mpy_32_16(hi, lo, FACT[nb_ener]), sh1)
    };
    quant_energy(l_x, sh1)
}

/// Decoder side comfort noise state
#[derive(Debug, Clone)]
pub struct CngDecoder {
    cur_gain: Word16,
    lsp_sid: [Word16; M],
    sid_gain: Word16,
}

impl Default for CngDecoder {
    fn default() -> Self {
        Self {
            cur_gain: 0,
            lsp_sid: LSP_SID_RESET,
            sid_gain: TAB_SIDGAIN[0],
        }
    }
}

/// Energy of the last good excitation, kept to recover an erased SID
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SidEnergy {
    pub ener: Word16,
    pub sh: Word16,
}

impl SidEnergy {
    /// Measure the frame excitation
    pub fn measure(exc: &[Word16]) -> Self {
        let mut l_temp: Word32 = 0;
        for &v in exc {
            l_temp = l_mac(l_temp, v, v);
        }
        let sh = norm_l(l_temp);
        Self {
            ener: round(l_shl(l_temp, sh)),
            sh: sub(16, sh),
        }
    }
}

impl CngDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current SID gain, linear
    pub fn sid_gain(&self) -> Word16 {
        self.sid_gain
    }

    /// Update the noise parameters from a received SID
    ///
    /// `index` holds the LSF indices; `gain_index` the quantized energy.
    pub fn receive_sid(&mut self, index: &[Word16; 3], gain_index: Word16, freq_prev: &mut FreqPrev) {
        self.sid_gain = TAB_SIDGAIN[(gain_index & 0x1f) as usize];
        sid_lsfq_decode(index, &mut self.lsp_sid, freq_prev);
    }

    /// Set the noise parameters directly
    pub fn set_parameters(&mut self, lsp: &[Word16; M], gain_index: Word16) {
        self.lsp_sid = *lsp;
        self.sid_gain = TAB_SIDGAIN[(gain_index & 0x1f) as usize];
    }

    /// Estimate the SID gain from the last speech frame's energy
    ///
    /// Used when the first SID after speech went missing.
    pub fn recover_sid_gain(&mut self, saved: SidEnergy) {
        let (ind, _) = qua_sidgain(&[saved.ener], &[saved.sh], 0);
        self.sid_gain = TAB_SIDGAIN[ind as usize];
        trace!(gain = self.sid_gain, "recovered SID gain from past excitation");
    }

    /// Generate one frame of comfort noise
    ///
    /// # Arguments
    /// * `after_speech` - The previous frame was active speech
    /// * `exc` - Excitation buffer, frame starts at `pos`
    /// * `lsp_old` - LSPs of the previous frame, updated
    /// * `a_t` - Interpolated LP coefficients of both subframes
    /// * `seed` - Noise generator state
    pub fn generate(
        &mut self,
        after_speech: bool,
        exc: &mut [Word16],
        pos: usize,
        lsp_old: &mut [Word16; M],
        a_t: &mut [Word16; 2 * MP1],
        seed: &mut Word16,
    ) {
        if after_speech {
            self.cur_gain = self.sid_gain;
        } else {
            self.cur_gain = add(mult_r(self.cur_gain, A_GAIN0), mult_r(self.sid_gain, A_GAIN1));
        }

        calc_exc_rand(self.cur_gain, exc, pos, seed, None);

        int_qlpc(lsp_old, &self.lsp_sid, a_t);
        *lsp_old = self.lsp_sid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::g729::constants::{EXC_HIST, INIT_SEED};

    #[test]
    fn test_random_sequence() {
        let mut seed = INIT_SEED;
        let a = random(&mut seed);
        assert_eq!(a, (11111i32 * 31821 + 13849) as i16);
        let b = random(&mut seed);
        assert_eq!(b, (a as i32 * 31821 + 13849) as i16);
    }

    #[test]
    fn test_sqrt_of_quarter() {
        // sqrt(0.25) = 0.5
        let r = sqrt_q15(0x2000_0000);
        assert!((r - 16384).abs() <= 2, "{r}");
    }

    #[test]
    fn test_zero_gain_is_silent() {
        let mut exc = [100; EXC_HIST + L_FRAME];
        let mut seed = INIT_SEED;
        let mut tracker = ExcErrTracker::new();
        calc_exc_rand(0, &mut exc, EXC_HIST, &mut seed, Some(&mut tracker));
        assert!(exc[EXC_HIST..].iter().all(|&v| v == 0));
        assert_eq!(seed, INIT_SEED);
    }

    #[test]
    fn test_excitation_energy_follows_gain() {
        let energy = |gain: Word16| {
            let mut exc = [0; EXC_HIST + L_FRAME];
            let mut seed = INIT_SEED;
            let mut total = 0f64;
            for _ in 0..20 {
                calc_exc_rand(gain, &mut exc, EXC_HIST, &mut seed, None);
                total += exc[EXC_HIST..].iter().map(|&v| (v as f64).powi(2)).sum::<f64>();
                exc.copy_within(L_FRAME.., 0);
            }
            (total / (20.0 * L_FRAME as f64)).sqrt()
        };
        let low = energy(TAB_SIDGAIN[10]);
        let high = energy(TAB_SIDGAIN[20]);
        assert!(low > 0.0);
        // about 20 dB apart
        let ratio = high / low;
        assert!((4.0..25.0).contains(&ratio), "rms ratio {ratio}");
    }

    #[test]
    fn test_quant_energy_limits() {
        assert_eq!(quant_energy(1, 10), (0, -12));
        assert_eq!(quant_energy(MAX_32, -10), (31, 66));
        let (idx, db) = quant_energy(1 << 20, 0);
        assert!((1..31).contains(&idx));
        assert!(db > -12 && db < 66);
    }

    #[test]
    fn test_quant_energy_is_monotonic() {
        let mut last = 0;
        for k in 0..31 {
            let (idx, _) = quant_energy(1 << k, 0);
            assert!(idx >= last, "{k}: {idx} < {last}");
            last = idx;
        }
    }

    #[test]
    fn test_sid_gain_smoothing() {
        let mut cng = CngDecoder::new();
        cng.set_parameters(&LSP_SID_RESET, 20);
        let mut exc = [0; EXC_HIST + L_FRAME];
        let mut lsp_old = LSP_SID_RESET;
        let mut a_t = [0; 2 * MP1];
        let mut seed = INIT_SEED;

        cng.generate(true, &mut exc, EXC_HIST, &mut lsp_old, &mut a_t, &mut seed);
        assert_eq!(cng.cur_gain, TAB_SIDGAIN[20]);

        cng.set_parameters(&LSP_SID_RESET, 10);
        cng.generate(false, &mut exc, EXC_HIST, &mut lsp_old, &mut a_t, &mut seed);
        let expected = add(mult_r(TAB_SIDGAIN[20], A_GAIN0), mult_r(TAB_SIDGAIN[10], A_GAIN1));
        assert_eq!(cng.cur_gain, expected);
        assert!(cng.cur_gain < TAB_SIDGAIN[20] && cng.cur_gain > TAB_SIDGAIN[10]);
    }

    #[test]
    fn test_recover_sid_gain_from_energy() {
        let mut cng = CngDecoder::new();
        let exc: Vec<Word16> = (0..L_FRAME).map(|i| if i % 2 == 0 { 300 } else { -300 }).collect();
        cng.recover_sid_gain(SidEnergy::measure(&exc));
        assert!(cng.sid_gain() > TAB_SIDGAIN[0]);
        assert!(cng.sid_gain() < TAB_SIDGAIN[31]);
    }
}
