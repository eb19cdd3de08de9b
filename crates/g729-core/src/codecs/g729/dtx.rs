//! Discontinuous transmission on the encoder side
//!
//! During inactive frames the encoder averages recent autocorrelations,
//! quantizes the residual energy and decides whether the noise changed
//! enough to send a SID frame. Between updates nothing is transmitted and
//! the encoder runs the decoder's comfort noise generator to stay in sync.

use super::basic_op::*;
use super::cng::{calc_exc_rand, qua_sidgain};
use super::constants::{
    A_GAIN0, A_GAIN1, FRAC_THRESH1, FRAC_THRESH2, FR_SID_MIN, M, MP1, NB_CURACF, NB_GAIN,
    NB_SUMACF, SIZ_ACF, SIZ_SUMACF,
};
use super::lpc::Levinson;
use super::lsp::{az_lsp, int_qlpc};
use super::lsp_quant::FreqPrev;
use super::sid_lsf::lsfq_noise;
use super::tables_dtx::TAB_SIDGAIN;
use super::taming::ExcErrTracker;
use tracing::trace;

/// Scale of an empty autocorrelation slot
const SH_EMPTY: Word16 = 40;

/// Indices and filter of a transmitted SID frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidFrame {
    /// Noise LSF indices: predictor, first stage, second stage
    pub lsf: [Word16; 3],
    /// Energy index into the SID gain table
    pub gain: Word16,
    /// Quantized energy in dB
    pub energy_db: Word16,
    /// LP filter the LSFs were derived from, Q12
    pub lpc: [Word16; MP1],
}

/// Sum `nb` autocorrelation vectors with individual scales
///
/// Returns the normalized sum and its scale.
fn calc_sum_acf(acf: &[Word16], sh_acf: &[Word16], nb: usize) -> ([Word16; MP1], Word16) {
    let sh0 = add(sh_acf[..nb].iter().copied().min().unwrap_or(SH_EMPTY), 14);

    let mut l_tab = [0 as Word32; MP1];
    for (i, chunk) in acf.chunks(MP1).take(nb).enumerate() {
        let temp = sub(sh0, sh_acf[i]);
        for (t, &v) in l_tab.iter_mut().zip(chunk.iter()) {
            *t = l_add(*t, l_shl(l_deposit_l(v), temp));
        }
    }

    let temp = norm_l(l_tab[0]);
    let mut sum = [0; MP1];
    for (s, &t) in sum.iter_mut().zip(l_tab.iter()) {
        *s = extract_h(l_shl(t, temp));
    }
    (sum, add(sh0, sub(temp, 16)))
}

/// Autocorrelation of an LP filter's coefficients
fn calc_rcoeff(coeff: &[Word16; MP1]) -> ([Word16; MP1], Word16) {
    let mut l_acc: Word32 = 0;
    for &c in coeff.iter() {
        l_acc = l_mac(l_acc, c, c);
    }
    let sh1 = norm_l(l_acc);
    let mut rcoeff = [0; MP1];
    rcoeff[0] = round(l_shl(l_acc, sh1));

    for i in 1..=M {
        let mut l_acc: Word32 = 0;
        for j in 0..=M - i {
            l_acc = l_mac(l_acc, coeff[j], coeff[j + i]);
        }
        rcoeff[i] = round(l_shl(l_acc, sh1));
    }
    (rcoeff, sh1)
}

/// Whether filtering the signal described by `acf` with the reference
/// filter raises its residual energy `alpha` by more than `frac_thresh`
fn cmp_filt(
    rcoeff: &[Word16; MP1],
    sh_rcoeff: Word16,
    acf: &[Word16; MP1],
    alpha: Word16,
    frac_thresh: Word16,
) -> bool {
    let mut sh = [0 as Word16; 2];
    let mut ind = 1;
    let l_temp0 = loop {
        let mut overflow = false;
        let temp1 = shr(rcoeff[0], sh[0]);
        let temp2 = shr(acf[0], sh[1]);
        let mut l_temp0 = l_shr(l_mult_o(temp1, temp2, &mut overflow), 1);
        for i in 1..=M {
            let temp1 = shr(rcoeff[i], sh[0]);
            let temp2 = shr(acf[i], sh[1]);
            l_temp0 = l_mac_o(l_temp0, temp1, temp2, &mut overflow);
        }
        if !overflow {
            break l_temp0;
        }
        sh[ind] = add(sh[ind], 1);
        ind = 1 - ind;
    };

    let temp1 = mult_r(alpha, frac_thresh);
    let l_temp1 = l_add(l_deposit_l(temp1), l_deposit_l(alpha));
    let shift = sub(add(sh_rcoeff, 9), add(sh[0], sh[1]));
    let l_temp1 = l_shl(l_temp1, shift);

    l_sub(l_temp0, l_temp1) > 0
}

/// Encoder side silence compression state
#[derive(Debug, Clone)]
pub struct DtxEncoder {
    lsp_sid_q: [Word16; M],
    past_coeff: [Word16; MP1],
    rcoeff: [Word16; MP1],
    sh_rcoeff: Word16,
    acf: [Word16; SIZ_ACF],
    sh_acf: [Word16; NB_CURACF],
    sum_acf: [Word16; SIZ_SUMACF],
    sh_sum_acf: [Word16; NB_SUMACF],
    ener: [Word16; NB_GAIN],
    sh_ener: [Word16; NB_GAIN],
    fr_cur: usize,
    cur_gain: Word16,
    nb_ener: usize,
    sid_gain: Word16,
    flag_chang: bool,
    prev_energy: Word16,
    count_fr0: Word16,
}

impl Default for DtxEncoder {
    fn default() -> Self {
        Self {
            lsp_sid_q: [0; M],
            past_coeff: [0; MP1],
            rcoeff: [0; MP1],
            sh_rcoeff: 0,
            acf: [0; SIZ_ACF],
            sh_acf: [SH_EMPTY; NB_CURACF],
            sum_acf: [0; SIZ_SUMACF],
            sh_sum_acf: [SH_EMPTY; NB_SUMACF],
            ener: [0; NB_GAIN],
            sh_ener: [SH_EMPTY; NB_GAIN],
            fr_cur: 0,
            cur_gain: 0,
            nb_ener: 0,
            sid_gain: 0,
            flag_chang: false,
            prev_energy: 0,
            count_fr0: 0,
        }
    }
}

impl DtxEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the unwindowed autocorrelations of a frame
    ///
    /// `exp_r` is the exponent returned by the autocorrelation; `voice`
    /// selects whether the average used for the past filter moves on.
    pub fn update(&mut self, r_h: &[Word16], exp_r: Word16, voice: bool) {
        self.acf.copy_within(0..SIZ_ACF - MP1, MP1);
        self.sh_acf.copy_within(0..NB_CURACF - 1, 1);

        self.sh_acf[0] = negate(add(16, exp_r));
        self.acf[..MP1].copy_from_slice(&r_h[..MP1]);

        self.fr_cur += 1;
        if self.fr_cur == NB_CURACF {
            self.fr_cur = 0;
            if voice {
                self.update_sum_acf();
            }
        }
    }

    fn update_sum_acf(&mut self) {
        self.sum_acf.copy_within(0..SIZ_SUMACF - MP1, MP1);
        self.sh_sum_acf.copy_within(0..NB_SUMACF - 1, 1);

        let (sum, sh) = calc_sum_acf(&self.acf, &self.sh_acf, NB_CURACF);
        self.sum_acf[..MP1].copy_from_slice(&sum);
        self.sh_sum_acf[0] = sh;
    }

    /// Filter of the long term autocorrelation average
    fn calc_pastfilt(&self, levinson: &mut Levinson) -> [Word16; MP1] {
        let (s_sum_acf, _) = calc_sum_acf(&self.sum_acf, &self.sh_sum_acf, NB_SUMACF);
        let mut coeff = [0; MP1];
        if s_sum_acf[0] == 0 {
            coeff[0] = 4096;
            return coeff;
        }
        let zero = [0; MP1];
        let mut rc = [0; M];
        let _ = levinson.solve(&s_sum_acf, &zero, &mut coeff, &mut rc);
        coeff
    }

    /// Encode one inactive frame
    ///
    /// # Arguments
    /// * `past_voice` - The previous frame was active speech
    /// * `levinson` - The encoder's LP solver
    /// * `exc` - Excitation buffer, frame starts at `pos`
    /// * `lsp_old_q` - Quantized LSPs of the previous frame, updated
    /// * `aq` - Interpolated LP coefficients of both subframes
    /// * `freq_prev` - MA memory of the LSP quantizer
    /// * `seed` - Comfort noise generator state
    /// * `taming` - Excitation error tracker
    ///
    /// Returns the SID to transmit, if any.
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &mut self,
        past_voice: bool,
        levinson: &mut Levinson,
        exc: &mut [Word16],
        pos: usize,
        lsp_old_q: &mut [Word16; M],
        aq: &mut [Word16; 2 * MP1],
        freq_prev: &mut FreqPrev,
        seed: &mut Word16,
        taming: &mut ExcErrTracker,
    ) -> Option<SidFrame> {
        self.ener.copy_within(0..NB_GAIN - 1, 1);
        self.sh_ener.copy_within(0..NB_GAIN - 1, 1);

        let (cur_acf, sh) = calc_sum_acf(&self.acf, &self.sh_acf, NB_CURACF);
        self.sh_ener[0] = sh;

        let mut cur_coeff = [0; MP1];
        cur_coeff[0] = 4096;
        if cur_acf[0] == 0 {
            self.ener[0] = 0;
        } else {
            let zero = [0; MP1];
            let mut rc = [0; M];
            if let Some(err) = levinson.solve(&cur_acf, &zero, &mut cur_coeff, &mut rc) {
                self.ener[0] = err;
            }
        }

        let energyq;
        let cur_igain;
        let send_sid = if past_voice {
            self.count_fr0 = 0;
            self.nb_ener = 1;
            (cur_igain, energyq) = qua_sidgain(&self.ener, &self.sh_ener, self.nb_ener);
            true
        } else {
            self.nb_ener = (self.nb_ener + 1).min(NB_GAIN);
            (cur_igain, energyq) = qua_sidgain(&self.ener, &self.sh_ener, self.nb_ener);

            if cmp_filt(&self.rcoeff, self.sh_rcoeff, &cur_acf, self.ener[0], FRAC_THRESH1) {
                self.flag_chang = true;
            }
            if sub(abs_s(sub(self.prev_energy, energyq)), 2) > 0 {
                self.flag_chang = true;
            }

            self.count_fr0 = add(self.count_fr0, 1);
            if self.count_fr0 < FR_SID_MIN {
                false
            } else {
                self.count_fr0 = FR_SID_MIN;
                self.flag_chang
            }
        };

        let mut sid = None;
        if send_sid {
            self.count_fr0 = 0;
            self.flag_chang = false;

            self.past_coeff = self.calc_pastfilt(levinson);
            (self.rcoeff, self.sh_rcoeff) = calc_rcoeff(&self.past_coeff);

            // a stationary past average becomes the new reference
            let drifted =
                cmp_filt(&self.rcoeff, self.sh_rcoeff, &cur_acf, self.ener[0], FRAC_THRESH2);
            let lpc = if !drifted {
                self.past_coeff
            } else {
                (self.rcoeff, self.sh_rcoeff) = calc_rcoeff(&cur_coeff);
                cur_coeff
            };

            let mut lsp_new = [0; M];
            az_lsp(&lpc, &mut lsp_new, lsp_old_q);

            let mut lsf = [0; 3];
            lsfq_noise(&lsp_new, &mut self.lsp_sid_q, freq_prev, &mut lsf);

            self.prev_energy = energyq;
            self.sid_gain = TAB_SIDGAIN[cur_igain as usize];
            trace!(gain = cur_igain, energy_db = energyq, "SID frame");
            sid = Some(SidFrame {
                lsf,
                gain: cur_igain,
                energy_db: energyq,
                lpc,
            });
        }

        if past_voice {
            self.cur_gain = self.sid_gain;
        } else {
            self.cur_gain = add(mult_r(self.cur_gain, A_GAIN0), mult_r(self.sid_gain, A_GAIN1));
        }

        calc_exc_rand(self.cur_gain, exc, pos, seed, Some(taming));

        int_qlpc(lsp_old_q, &self.lsp_sid_q, aq);
        *lsp_old_q = self.lsp_sid_q;

        if self.fr_cur == 0 {
            self.update_sum_acf();
        }

        sid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::g729::constants::{EXC_HIST, INIT_SEED, L_FRAME, L_WINDOW, NP};
    use crate::codecs::g729::lpc::autocorr;
    use crate::codecs::g729::lsp_quant::freq_prev_reset;
    use crate::codecs::g729::tables::LSP_RESET;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    struct Harness {
        dtx: DtxEncoder,
        levinson: Levinson,
        exc: [Word16; EXC_HIST + L_FRAME],
        lsp_old_q: [Word16; M],
        aq: [Word16; 2 * MP1],
        freq_prev: FreqPrev,
        seed: Word16,
        taming: ExcErrTracker,
        rng: SmallRng,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dtx: DtxEncoder::new(),
                levinson: Levinson::new(),
                exc: [0; EXC_HIST + L_FRAME],
                lsp_old_q: LSP_RESET,
                aq: [0; 2 * MP1],
                freq_prev: freq_prev_reset(),
                seed: INIT_SEED,
                taming: ExcErrTracker::new(),
                rng: SmallRng::seed_from_u64(7),
            }
        }

        fn feed(&mut self, amp: i16, voice: bool) {
            let window: Vec<Word16> =
                (0..L_WINDOW).map(|_| self.rng.gen_range(-amp..=amp)).collect();
            let mut r_h = [0; NP + 1];
            let mut r_l = [0; NP + 1];
            let exp = autocorr(&window, NP, &mut r_h, &mut r_l);
            self.dtx.update(&r_h, exp, voice);
        }

        fn encode(&mut self, past_voice: bool) -> Option<SidFrame> {
            let sid = self.dtx.encode(
                past_voice,
                &mut self.levinson,
                &mut self.exc,
                EXC_HIST,
                &mut self.lsp_old_q,
                &mut self.aq,
                &mut self.freq_prev,
                &mut self.seed,
                &mut self.taming,
            );
            self.exc.copy_within(L_FRAME.., 0);
            sid
        }
    }

    #[test]
    fn test_sum_acf_of_empty_history() {
        let acf = [0; SIZ_ACF];
        let (sum, _) = calc_sum_acf(&acf, &[SH_EMPTY; NB_CURACF], NB_CURACF);
        assert!(sum.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_sum_acf_aligns_scales() {
        let mut acf = [0; 2 * MP1];
        acf[0] = 16384;
        acf[MP1] = 16384;
        // a scale one lower doubles the weight
        let (sum, sh) = calc_sum_acf(&acf, &[0, -1], 2);
        assert_eq!(sum[0], 24576);
        assert_eq!(sh, -1);
    }

    #[test]
    fn test_flat_reference_against_white_and_colored_signals() {
        let mut flat = [0; MP1];
        flat[0] = 4096;
        let (rcoeff, sh) = calc_rcoeff(&flat);
        assert_eq!((rcoeff[0], sh), (16384, 5));

        let mut acf = [0; MP1];
        acf[0] = 16384;
        // white: the flat filter is already optimal
        assert!(!cmp_filt(&rcoeff, sh, &acf, 16384, FRAC_THRESH1));
        // strongly predictable: the flat filter leaves far too much energy
        assert!(cmp_filt(&rcoeff, sh, &acf, 4000, FRAC_THRESH1));
    }

    #[test]
    fn test_first_silent_frame_sends_sid() {
        let mut h = Harness::new();
        for _ in 0..4 {
            h.feed(2000, true);
        }
        h.feed(30, false);
        let sid = h.encode(true).expect("SID after speech");
        assert!(sid.gain < 32);
        assert_eq!(sid.lpc[0], 4096);
    }

    #[test]
    fn test_stationary_noise_spaces_sids() {
        let mut h = Harness::new();
        for _ in 0..4 {
            h.feed(2000, true);
        }
        let mut sent = Vec::new();
        for n in 0..40 {
            h.feed(40, false);
            if h.encode(n == 0).is_some() {
                sent.push(n);
            }
        }
        assert_eq!(sent[0], 0);
        for w in sent.windows(2) {
            assert!(w[1] - w[0] >= FR_SID_MIN as usize, "{sent:?}");
        }
        assert!(sent.len() < 20, "{sent:?}");
    }

    #[test]
    fn test_level_change_triggers_sid() {
        let mut h = Harness::new();
        for _ in 0..4 {
            h.feed(2000, true);
        }
        h.feed(40, false);
        let first = h.encode(true).expect("first SID");
        for _ in 0..6 {
            h.feed(40, false);
            h.encode(false);
        }
        let mut louder = None;
        for _ in 0..6 {
            h.feed(4000, false);
            if let Some(sid) = h.encode(false) {
                louder = Some(sid);
                break;
            }
        }
        let louder = louder.expect("level jump sends a SID");
        assert!(louder.energy_db > first.energy_db);
    }
}
