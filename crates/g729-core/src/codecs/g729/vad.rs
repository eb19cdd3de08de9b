//! Voice activity detection
//!
//! Four features per frame: full band energy, low band energy, spectral
//! distortion against the running mean LSFs, and zero crossing rate. The
//! first 32 frames initialize the running means; afterwards the differences
//! to the background noise means feed a piecewise linear decision followed
//! by several smoothing stages.

use super::basic_op::*;
use super::constants::{M, NP};
use super::dspfunc::log2;
use super::oper_32b::{l_comp, mpy_32_16};
use super::tables_dtx::LBF_CORR;

const ZC_START: usize = 120;
const ZC_END: usize = 200;
const INIT_FRAME: Word16 = 32;
const INIT_COUNT: Word16 = 20;

/// Normalization `32 / (32 - n)` of the initial means as a Q15 factor and
/// a left shift, `n` being the number of discarded low energy frames
const NORM_FACTORS: [(Word16, Word16); INIT_FRAME as usize + 1] = {
    let mut t = [(0, 0); INIT_FRAME as usize + 1];
    let mut n = 0;
    while n < INIT_FRAME as usize {
        let frames = (INIT_FRAME as i32) - n as i32;
        let mut shift = 0;
        while (frames << shift) < INIT_FRAME as i32 {
            shift += 1;
        }
        let mut factor = ((32768 * INIT_FRAME as i32) + (frames << shift) / 2) / (frames << shift);
        if factor > MAX_16 as i32 {
            factor = MAX_16 as i32;
        }
        t[n] = (factor as Word16, shift as Word16);
        n += 1;
    }
    t
};

/// Voice/noise decision of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadDecision {
    /// Background noise
    Noise,
    /// Active speech
    Voice,
}

impl VadDecision {
    pub fn is_voice(self) -> bool {
        self == Self::Voice
    }
}

/// Features the detector reads from the LP analysis of a frame
pub struct VadInput<'a> {
    /// Second reflection coefficient, Q15
    pub rc: Word16,
    /// Normalized LSFs of the unquantized filter, Q15
    pub lsf: &'a [Word16; M],
    /// Lag-windowed autocorrelations, MSB
    pub r_h: &'a [Word16],
    /// Lag-windowed autocorrelations, LSB
    pub r_l: &'a [Word16],
    /// Exponent of `r[0]`
    pub exp_r0: Word16,
    /// Pre-processed analysis window
    pub sigpp: &'a [Word16],
    /// Frame counter, starting at 1
    pub frm_count: Word16,
    /// Decisions of the two previous frames
    pub prev_marker: VadDecision,
    pub pprev_marker: VadDecision,
}

/// Voice activity detector state
#[derive(Debug, Clone)]
pub struct Vad {
    mean_lsf: [Word16; M],
    min_buffer: [Word16; 16],
    prev_min: Word16,
    next_min: Word16,
    min: Word16,
    mean_e: Word16,
    mean_se: Word16,
    mean_sle: Word16,
    mean_szc: Word16,
    prev_energy: Word16,
    count_sil: Word16,
    count_update: Word16,
    count_ext: Word16,
    flag: bool,
    less_count: usize,
}

impl Default for Vad {
    fn default() -> Self {
        Self {
            mean_lsf: [0; M],
            min_buffer: [0; 16],
            prev_min: 0,
            next_min: 0,
            min: MAX_16,
            mean_e: 0,
            mean_se: 0,
            mean_sle: 0,
            mean_szc: 0,
            prev_energy: 0,
            count_sil: 0,
            count_update: 0,
            count_ext: 0,
            flag: true,
            less_count: 0,
        }
    }
}

/// Frame energy in Q11 log units from a (possibly filtered) `r[0]`
fn log_energy(l_r0: Word32, exp_r0: Word16) -> Word16 {
    let (exp, frac) = log2(l_r0);
    let mut acc0 = mpy_32_16(exp, frac, 9864);
    let i = sub(sub(exp_r0, 1), 1);
    acc0 = l_mac(acc0, 9864, i);
    acc0 = l_shl(acc0, 11);
    sub(extract_h(acc0), 4875)
}

impl Vad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one frame
    pub fn detect(&mut self, input: &VadInput<'_>) -> VadDecision {
        let frm_count = input.frm_count;
        let lsf = input.lsf;

        let energy = log_energy(l_comp(input.r_h[0], input.r_l[0]), input.exp_r0);

        let mut acc0 = 0;
        for i in 1..=NP {
            acc0 = l_mac(acc0, input.r_h[i], LBF_CORR[i]);
        }
        acc0 = l_shl(acc0, 1);
        acc0 = l_mac(acc0, input.r_h[0], LBF_CORR[0]);
        let energy_low = log_energy(acc0, input.exp_r0);

        let mut acc0 = 0;
        for i in 0..M {
            let j = sub(lsf[i], self.mean_lsf[i]);
            acc0 = l_mac(acc0, j, j);
        }
        let sd = extract_h(acc0);

        let mut zc: Word16 = 0;
        for i in ZC_START + 1..=ZC_END {
            if mult(input.sigpp[i - 1], input.sigpp[i]) < 0 {
                zc = add(zc, 410);
            }
        }

        self.track_minimum(energy, frm_count);

        let mut marker = VadDecision::Noise;
        if frm_count <= INIT_FRAME {
            if energy < 3072 {
                marker = VadDecision::Noise;
                self.less_count += 1;
            } else {
                marker = VadDecision::Voice;
                self.mean_e = extract_h(l_mac(l_deposit_h(self.mean_e), energy, 1024));
                self.mean_szc = extract_h(l_mac(l_deposit_h(self.mean_szc), zc, 1024));
                for i in 0..M {
                    self.mean_lsf[i] = extract_h(l_mac(l_deposit_h(self.mean_lsf[i]), lsf[i], 1024));
                }
            }
        }

        if frm_count >= INIT_FRAME {
            if frm_count == INIT_FRAME {
                let (factor, shift) = NORM_FACTORS[self.less_count.min(INIT_FRAME as usize)];
                let scale = |v: Word16| extract_h(l_shl(l_mult(v, factor), shift));
                self.mean_e = scale(self.mean_e);
                self.mean_szc = scale(self.mean_szc);
                for v in self.mean_lsf.iter_mut() {
                    *v = scale(*v);
                }
                self.mean_se = sub(self.mean_e, 2048);
                self.mean_sle = sub(self.mean_e, 2458);
            }

            let d_se = sub(self.mean_se, energy);
            let d_sle = sub(self.mean_sle, energy_low);
            let d_szc = sub(self.mean_szc, zc);

            marker = if energy < 3072 {
                VadDecision::Noise
            } else {
                make_decision(d_sle, d_se, sd, d_szc)
            };

            let mut v_flag = false;
            if input.prev_marker.is_voice()
                && !marker.is_voice()
                && add(d_se, 410) < 0
                && energy > 3072
            {
                marker = VadDecision::Voice;
                v_flag = true;
            }

            if self.flag {
                if input.pprev_marker.is_voice()
                    && input.prev_marker.is_voice()
                    && !marker.is_voice()
                    && abs_s(sub(self.prev_energy, energy)) <= 614
                {
                    self.count_ext += 1;
                    marker = VadDecision::Voice;
                    v_flag = true;
                    if self.count_ext > 4 {
                        self.count_ext = 0;
                        self.flag = false;
                    }
                }
            } else {
                self.flag = true;
            }

            if !marker.is_voice() {
                self.count_sil = add(self.count_sil, 1);
            }

            if marker.is_voice()
                && self.count_sil > 10
                && sub(energy, self.prev_energy) <= 614
            {
                marker = VadDecision::Noise;
                self.count_sil = 0;
            }

            if marker.is_voice() {
                self.count_sil = 0;
            }

            if sub(energy, 614) < self.mean_se && frm_count > 128 && !v_flag && input.rc < 19661 {
                marker = VadDecision::Noise;
            }

            if sub(energy, 614) < self.mean_se && input.rc < 24576 && sd < 83 {
                self.update_means(energy, energy_low, zc, lsf);
            }

            if frm_count > 128
                && ((self.mean_se < self.prev_min && sd < 83)
                    || sub(sub(self.mean_se, self.prev_min), 2048) > 0)
            {
                self.mean_se = self.prev_min;
                self.count_update = 0;
            }
        }

        self.prev_energy = energy;
        marker
    }

    /// Minimum energy over the last 128 frames, kept in 16 blocks of 8
    fn track_minimum(&mut self, energy: Word16, frm_count: Word16) {
        if frm_count < 129 {
            if energy < self.min {
                self.min = energy;
                self.prev_min = energy;
            }
            if frm_count & 0x7 == 0 {
                let i = (shr(frm_count, 3) - 1) as usize;
                self.min_buffer[i] = self.min;
                self.min = MAX_16;
            }
        }

        if frm_count & 0x7 == 0 {
            self.prev_min = self.min_buffer.iter().copied().fold(self.min_buffer[0], Word16::min);
        }

        if frm_count >= 129 {
            if frm_count & 0x7 == 1 {
                self.min = self.prev_min;
                self.next_min = MAX_16;
            }
            if energy < self.min {
                self.min = energy;
            }
            if energy < self.next_min {
                self.next_min = energy;
            }
            if frm_count & 0x7 == 0 {
                self.min_buffer.copy_within(1.., 0);
                self.min_buffer[15] = self.next_min;
                self.prev_min =
                    self.min_buffer.iter().copied().fold(self.min_buffer[0], Word16::min);
            }
        }
    }

    /// First order update of the background noise means; the filter
    /// stiffens as more updates accumulate
    fn update_means(&mut self, energy: Word16, energy_low: Word16, zc: Word16, lsf: &[Word16; M]) {
        self.count_update = add(self.count_update, 1);
        let c = self.count_update;
        let (coef, c_coef, coef_zc, c_coef_zc, coef_sd, c_coef_sd) = if c < INIT_COUNT {
            (24576, 8192, 26214, 6554, 19661, 13017)
        } else if c < INIT_COUNT + 10 {
            (31130, 1638, 30147, 2621, 30802, 1966)
        } else if c < INIT_COUNT + 20 {
            (31785, 983, 30802, 1966, 31457, 1311)
        } else if c < INIT_COUNT + 30 {
            (32440, 328, 31457, 1311, 32440, 328)
        } else if c < INIT_COUNT + 40 {
            (32604, 164, 32440, 328, 32702, 66)
        } else {
            (32604, 164, 32702, 66, 32702, 66)
        };

        self.mean_se = extract_h(l_mac(l_mult(coef, self.mean_se), c_coef, energy));
        self.mean_sle = extract_h(l_mac(l_mult(coef, self.mean_sle), c_coef, energy_low));
        self.mean_szc = extract_h(l_mac(l_mult(coef_zc, self.mean_szc), c_coef_zc, zc));
        for i in 0..M {
            self.mean_lsf[i] = extract_h(l_mac(l_mult(coef_sd, self.mean_lsf[i]), c_coef_sd, lsf[i]));
        }
    }
}

/// Piecewise linear boundaries in the space of the four feature differences
fn make_decision(d_sle: Word16, d_se: Word16, sd: Word16, d_szc: Word16) -> VadDecision {
    use VadDecision::{Noise, Voice};

    // SD against dSZC
    let acc0 = l_add(l_shr(l_mac(l_mult(d_szc, -14680), 8192, -28521), 8), l_deposit_h(sd));
    if acc0 > 0 {
        return Voice;
    }
    let acc0 = l_add(l_shr(l_mac(l_mult(d_szc, 19065), 8192, -19446), 7), l_deposit_h(sd));
    if acc0 > 0 {
        return Voice;
    }

    // dSE against dSZC
    let acc0 = l_add(l_shr(l_mac(l_mult(d_szc, 20480), 8192, 16384), 2), l_deposit_h(d_se));
    if acc0 < 0 {
        return Voice;
    }
    let acc0 = l_add(l_shr(l_mac(l_mult(d_szc, -16384), 8192, 19660), 2), l_deposit_h(d_se));
    if acc0 < 0 {
        return Voice;
    }
    if l_mac(l_mult(d_se, 32767), 1024, 30802) < 0 {
        return Voice;
    }

    // dSE against SD
    let acc0 = l_mac(l_mac(l_mult(sd, -28160), 64, 19988), d_se, 512);
    if acc0 < 0 {
        return Voice;
    }
    if l_mac(l_mult(sd, 32767), 32, -30199) > 0 {
        return Voice;
    }

    // dSLE against dSZC
    let acc0 = l_add(l_shr(l_mac(l_mult(d_szc, -20480), 8192, 22938), 2), l_deposit_h(d_sle));
    if acc0 < 0 {
        return Voice;
    }
    let acc0 = l_add(l_shr(l_mac(l_mult(d_szc, 23831), 4096, 31576), 2), l_deposit_h(d_sle));
    if acc0 < 0 {
        return Voice;
    }
    if l_mac(l_mult(d_sle, 32767), 2048, 17367) < 0 {
        return Voice;
    }

    // dSLE against SD
    let acc0 = l_mac(l_mac(l_mult(sd, -22400), 32, 25395), d_sle, 256);
    if acc0 < 0 {
        return Voice;
    }

    // dSLE against dSE
    let acc0 = l_add(l_mac(l_mult(d_se, -30427), 256, -29959), l_deposit_h(d_sle));
    if acc0 > 0 {
        return Voice;
    }
    let acc0 = l_add(l_mac(l_mult(d_se, -23406), 512, 28087), l_deposit_h(d_sle));
    if acc0 < 0 {
        return Voice;
    }
    let acc0 = l_mac(l_mac(l_mult(d_se, 24576), 1024, 29491), d_sle, 16384);
    if acc0 < 0 {
        return Voice;
    }

    Noise
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::g729::constants::{L_WINDOW, MP1};
    use crate::codecs::g729::lpc::{autocorr, lag_window, Levinson};
    use crate::codecs::g729::lsp::{az_lsp, lsp_lsf};
    use crate::codecs::g729::tables::LSP_RESET;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    /// Run the detector over consecutive analysis windows
    fn run(frames: &[[Word16; L_WINDOW]]) -> Vec<VadDecision> {
        let mut vad = Vad::new();
        let mut lev = Levinson::new();
        let mut lsp_old = LSP_RESET;
        let mut prev = VadDecision::Voice;
        let mut pprev = VadDecision::Voice;
        let mut out = Vec::new();

        for (n, window) in frames.iter().enumerate() {
            let mut r_h = [0; NP + 1];
            let mut r_l = [0; NP + 1];
            let exp_r0 = autocorr(window, NP, &mut r_h, &mut r_l);
            lag_window(NP, &mut r_h, &mut r_l);
            let mut a = [0; MP1];
            let mut rc = [0; M];
            lev.solve(&r_h, &r_l, &mut a, &mut rc);
            let mut lsp = [0; M];
            if !az_lsp(&a, &mut lsp, &lsp_old) {
                lsp = lsp_old;
            }
            lsp_old = lsp;
            let mut lsf = [0; M];
            lsp_lsf(&lsp, &mut lsf);

            let d = vad.detect(&VadInput {
                rc: rc[1],
                lsf: &lsf,
                r_h: &r_h,
                r_l: &r_l,
                exp_r0,
                sigpp: window,
                frm_count: (n + 1) as Word16,
                prev_marker: prev,
                pprev_marker: pprev,
            });
            pprev = prev;
            prev = d;
            out.push(d);
        }
        out
    }

    fn noise_frames(rng: &mut SmallRng, amp: i16, count: usize) -> Vec<[Word16; L_WINDOW]> {
        (0..count)
            .map(|_| {
                let mut w = [0; L_WINDOW];
                for v in w.iter_mut() {
                    *v = rng.gen_range(-amp..=amp);
                }
                w
            })
            .collect()
    }

    #[test]
    fn test_normalization_factors() {
        assert_eq!(NORM_FACTORS[0], (MAX_16, 0));
        // 32 / 16 = 2
        assert_eq!(NORM_FACTORS[16], (MAX_16, 1));
        // 32 / 24 = 1.33 = 0.67 << 1
        assert_eq!(NORM_FACTORS[8], (21845, 1));
        for &(factor, shift) in NORM_FACTORS[..INIT_FRAME as usize].iter() {
            assert!(factor >= 16384);
            assert!((0..=5).contains(&shift));
        }
    }

    #[test]
    fn test_silence_is_noise() {
        let frames = vec![[0; L_WINDOW]; 60];
        let decisions = run(&frames);
        assert!(decisions.iter().all(|d| !d.is_voice()));
    }

    #[test]
    fn test_low_noise_settles_to_noise() {
        let mut rng = SmallRng::seed_from_u64(7);
        let frames = noise_frames(&mut rng, 30, 200);
        let decisions = run(&frames);
        let tail = &decisions[150..];
        let noise = tail.iter().filter(|d| !d.is_voice()).count();
        assert!(noise > tail.len() * 2 / 3, "{noise} of {}", tail.len());
    }

    #[test]
    fn test_loud_burst_after_noise_is_voice() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut frames = noise_frames(&mut rng, 30, 150);
        for n in 0..10 {
            let mut w = [0; L_WINDOW];
            for (i, v) in w.iter_mut().enumerate() {
                let t = (n * 80 + i) as f64;
                *v = (12000.0 * (2.0 * std::f64::consts::PI * 300.0 * t / 8000.0).sin()) as Word16;
            }
            frames.push(w);
        }
        let decisions = run(&frames);
        assert!(decisions[150..].iter().all(|d| d.is_voice()));
    }

    #[test]
    fn test_decision_boundaries() {
        // identical to the background: noise
        assert_eq!(make_decision(0, 0, 0, 0), VadDecision::Noise);
        // much louder than the background: voice
        assert_eq!(make_decision(-8000, -8000, 0, 0), VadDecision::Voice);
        // large spectral change: voice
        assert_eq!(make_decision(0, 0, 5000, 0), VadDecision::Voice);
    }
}
