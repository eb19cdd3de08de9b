//! Adaptive postfilter of the decoder
//!
//! A long term (pitch) postfilter on the residual of `A(z/0.55)`, a
//! short term filter `A(z/0.55)/A(z/0.7)` with tilt compensation, and an
//! automatic gain control matching the output energy to the synthesis.

use super::basic_op::*;
use super::constants::{
    AGC_FAC, AGC_FAC1, GAMMA1_PST, GAMMA2_PST, GAMMAP, GAMMAP_2, INV_GAMMAP, L_FRAME, L_H,
    L_SUBFR, M, MP1, MU, PIT_MAX,
};
use super::dspfunc::inv_sqrt;
use super::filter::{residu, syn_filt};
use super::lsp::weight_az;

const HIST: usize = PIT_MAX as usize;

/// Postfilter state
#[derive(Debug, Clone)]
pub struct PostFilter {
    /// Residual of `A(z/GAMMA2_PST)` with `PIT_MAX` samples of history
    res2: [Word16; HIST + L_SUBFR],
    /// `res2` divided by 4
    scal_res2: [Word16; HIST + L_SUBFR],
    mem_syn_pst: [Word16; M],
    mem_pre: Word16,
    past_gain: Word16,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            res2: [0; HIST + L_SUBFR],
            scal_res2: [0; HIST + L_SUBFR],
            mem_syn_pst: [0; M],
            mem_pre: 0,
            past_gain: 4096,
        }
    }
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Postfilter one frame
    ///
    /// # Arguments
    /// * `syn` - Synthesis with `M` samples of history (`M + L_FRAME`)
    /// * `az` - Interpolated LP coefficients of both subframes
    /// * `t` - Integer pitch lags of both subframes
    /// * `voiced` - Frame carries speech; comfort noise skips the pitch
    ///   postfilter
    /// * `out` - Postfiltered speech
    pub fn process(
        &mut self,
        syn: &[Word16],
        az: &[Word16; 2 * MP1],
        t: &[Word16; 2],
        voiced: bool,
        out: &mut [Word16; L_FRAME],
    ) {
        let mut ap3 = [0; MP1];
        let mut ap4 = [0; MP1];
        let mut res2_pst = [0; L_SUBFR];

        for (sf, i_subfr) in (0..L_FRAME).step_by(L_SUBFR).enumerate() {
            let a = &az[sf * MP1..(sf + 1) * MP1];

            let mut t0_min = sub(t[sf], 3);
            let mut t0_max = add(t0_min, 6);
            if t0_max > PIT_MAX {
                t0_max = PIT_MAX;
                t0_min = sub(t0_max, 6);
            }

            weight_az(a, GAMMA2_PST, &mut ap3);
            weight_az(a, GAMMA1_PST, &mut ap4);

            residu(&ap3, &syn[i_subfr..i_subfr + M + L_SUBFR], &mut self.res2[HIST..]);
            for j in 0..L_SUBFR {
                self.scal_res2[HIST + j] = shr(self.res2[HIST + j], 2);
            }

            if voiced {
                self.pitch_postfilter(t0_min, t0_max, &mut res2_pst);
            } else {
                res2_pst.copy_from_slice(&self.res2[HIST..]);
            }

            // tilt compensation from the impulse response of A(z/g2)/A(z/g1)
            let mut h = [0; L_H];
            h[..MP1].copy_from_slice(&ap3);
            let input = h;
            let mut zero = [0; M];
            syn_filt(&ap4, &input, &mut h, &mut zero, false);

            let mut l_tmp = l_mult(h[0], h[0]);
            for i in 1..L_H {
                l_tmp = l_mac(l_tmp, h[i], h[i]);
            }
            let temp1 = extract_h(l_tmp);

            let mut l_tmp = l_mult(h[0], h[1]);
            for i in 1..L_H - 1 {
                l_tmp = l_mac(l_tmp, h[i], h[i + 1]);
            }
            let mut temp2 = extract_h(l_tmp);

            if temp2 <= 0 {
                temp2 = 0;
            } else {
                temp2 = div_s(mult(temp2, MU), temp1);
            }

            self.preemphasis(&mut res2_pst, temp2);

            let out_sf = &mut out[i_subfr..i_subfr + L_SUBFR];
            syn_filt(&ap4, &res2_pst, out_sf, &mut self.mem_syn_pst, true);

            self.agc(&syn[M + i_subfr..M + i_subfr + L_SUBFR], out_sf);

            self.res2.copy_within(L_SUBFR.., 0);
            self.scal_res2.copy_within(L_SUBFR.., 0);
        }
    }

    /// Harmonic postfilter around the decoded lag
    fn pitch_postfilter(&self, t0_min: Word16, t0_max: Word16, signal_pst: &mut [Word16; L_SUBFR]) {
        let scal = &self.scal_res2;
        let delayed = |t: Word16| HIST - t as usize;

        let mut cor_max = MIN_32;
        let mut t0 = t0_min;
        for i in t0_min..=t0_max {
            let d = delayed(i);
            let mut corr = 0;
            for j in 0..L_SUBFR {
                corr = l_mac(corr, scal[HIST + j], scal[d + j]);
            }
            if l_sub(corr, cor_max) > 0 {
                cor_max = corr;
                t0 = i;
            }
        }

        let d = delayed(t0);
        let mut ener = 1;
        let mut ener0 = 1;
        for j in 0..L_SUBFR {
            ener = l_mac(ener, scal[d + j], scal[d + j]);
            ener0 = l_mac(ener0, scal[HIST + j], scal[HIST + j]);
        }
        if cor_max < 0 {
            cor_max = 0;
        }

        let temp = cor_max.max(ener).max(ener0);
        let j = norm_l(temp);
        let mut cmax = round(l_shl(cor_max, j));
        let mut en = round(l_shl(ener, j));
        let en0 = round(l_shl(ener0, j));

        // prediction gain below 3 dB switches the filter off
        let temp = l_sub(l_mult(cmax, cmax), l_shr(l_mult(en, en0), 1));
        let signal = &self.res2;
        if temp < 0 {
            signal_pst.copy_from_slice(&signal[HIST..]);
            return;
        }

        let (g0, gain) = if cmax > en {
            (INV_GAMMAP, GAMMAP_2)
        } else {
            cmax = shr(mult(cmax, GAMMAP), 1);
            en = shr(en, 1);
            let i = add(cmax, en);
            if i > 0 {
                let gain = div_s(cmax, i);
                (sub(32767, gain), gain)
            } else {
                (32767, 0)
            }
        };

        for i in 0..L_SUBFR {
            signal_pst[i] = add(mult(g0, signal[HIST + i]), mult(gain, signal[d + i]));
        }
    }

    /// First order tilt compensation `1 - g z^-1`
    fn preemphasis(&mut self, signal: &mut [Word16; L_SUBFR], g: Word16) {
        let last = signal[L_SUBFR - 1];
        for i in (1..L_SUBFR).rev() {
            signal[i] = sub(signal[i], mult(g, signal[i - 1]));
        }
        signal[0] = sub(signal[0], mult(g, self.mem_pre));
        self.mem_pre = last;
    }

    /// Scale `sig_out` so that its energy follows `sig_in`
    fn agc(&mut self, sig_in: &[Word16], sig_out: &mut [Word16]) {
        let mut s = 0;
        for &v in sig_out.iter() {
            let v = shr(v, 2);
            s = l_mac(s, v, v);
        }
        if s == 0 {
            self.past_gain = 0;
            return;
        }
        let mut exp = sub(norm_l(s), 1);
        let gain_out = round(l_shl(s, exp));

        let mut s = 0;
        for &v in sig_in.iter() {
            let v = shr(v, 2);
            s = l_mac(s, v, v);
        }

        let g0 = if s == 0 {
            0
        } else {
            let i = norm_l(s);
            let gain_in = round(l_shl(s, i));
            exp = sub(exp, i);

            // g0 = (1 - AGC_FAC) * sqrt(gain_in / gain_out), Q12
            let s = l_deposit_l(div_s(gain_out, gain_in));
            let s = l_shr(l_shl(s, 7), exp);
            let s = inv_sqrt(s);
            let i = round(l_shl(s, 9));
            mult(i, AGC_FAC1)
        };

        let mut gain = self.past_gain;
        for v in sig_out.iter_mut() {
            gain = add(mult(gain, AGC_FAC), g0);
            *v = extract_h(l_shl(l_mult(*v, gain), 3));
        }
        self.past_gain = gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_az() -> [Word16; 2 * MP1] {
        let mut az = [0; 2 * MP1];
        az[0] = 4096;
        az[MP1] = 4096;
        az[1] = -1500;
        az[MP1 + 1] = -1500;
        az[2] = 600;
        az[MP1 + 2] = 600;
        az
    }

    fn pulse_train(period: usize, frames: usize) -> Vec<Word16> {
        (0..frames * L_FRAME)
            .map(|n| if n % period == 0 { 6000 } else { ((n * 37) % 200) as Word16 - 100 })
            .collect()
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut pf = PostFilter::new();
        let syn = [0; M + L_FRAME];
        let mut out = [1; L_FRAME];
        pf.process(&syn, &flat_az(), &[40, 40], true, &mut out);
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_agc_tracks_input_energy() {
        let mut pf = PostFilter::new();
        let signal = pulse_train(50, 12);
        let az = flat_az();
        let mut hist = [0; M];
        let mut e_in = 0f64;
        let mut e_out = 0f64;
        for (f, frame) in signal.chunks(L_FRAME).enumerate() {
            let mut syn = [0; M + L_FRAME];
            syn[..M].copy_from_slice(&hist);
            syn[M..].copy_from_slice(frame);
            hist.copy_from_slice(&frame[L_FRAME - M..]);

            let mut out = [0; L_FRAME];
            pf.process(&syn, &az, &[50, 50], true, &mut out);
            if f >= 4 {
                e_in += frame.iter().map(|&v| (v as f64).powi(2)).sum::<f64>();
                e_out += out.iter().map(|&v| (v as f64).powi(2)).sum::<f64>();
            }
        }
        let ratio = e_out / e_in;
        assert!((0.5..2.0).contains(&ratio), "energy ratio {ratio}");
    }

    #[test]
    fn test_comfort_noise_skips_pitch_stage() {
        let signal = pulse_train(50, 6);
        let az = flat_az();
        let mut voiced = PostFilter::new();
        let mut unvoiced = PostFilter::new();
        let mut differs = false;
        let mut hist = [0; M];
        for frame in signal.chunks(L_FRAME) {
            let mut syn = [0; M + L_FRAME];
            syn[..M].copy_from_slice(&hist);
            syn[M..].copy_from_slice(frame);
            hist.copy_from_slice(&frame[L_FRAME - M..]);

            let mut a = [0; L_FRAME];
            let mut b = [0; L_FRAME];
            voiced.process(&syn, &az, &[50, 50], true, &mut a);
            unvoiced.process(&syn, &az, &[50, 50], false, &mut b);
            differs |= a != b;
        }
        assert!(differs);
    }

    #[test]
    fn test_preemphasis_carries_memory() {
        let mut pf = PostFilter::new();
        let mut sig = [1000; L_SUBFR];
        pf.preemphasis(&mut sig, 16384);
        assert_eq!(sig[0], 1000);
        assert_eq!(sig[1], 500);
        let mut sig = [1000; L_SUBFR];
        pf.preemphasis(&mut sig, 16384);
        assert_eq!(sig[0], 500);
    }
}
