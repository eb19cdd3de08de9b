//! Gains of the adaptive and fixed codebooks
//!
//! The fixed codebook gain is predicted from the energies of the last four
//! quantized gains (MA prediction in the log domain). The encoder quantizes
//! the pitch gain and the correction factor of the prediction jointly with
//! a two-stage conjugate-structure codebook.

use super::basic_op::*;
use super::constants::{GP0999, GPCLIP2, INV_COEF, L_SUBFR, NCAN1, NCAN2, NCODE1, NCODE2};
use super::dspfunc::{log2, pow2};
use super::oper_32b::{l_comp, l_extract, mpy_32_16};
use super::tables::{COEF, GBK1, GBK2, IMAP1, IMAP2, L_COEF, MAP1, MAP2, PRED, THR1, THR2};

const NCODE2_B: Word16 = 4;

/// Past quantized energies of -14 dB, Q10
const PAST_QUA_EN_RESET: Word16 = -14336;

/// MA predictor of the fixed codebook gain
#[derive(Debug, Clone)]
pub struct GainPredictor {
    past_qua_en: [Word16; 4],
}

impl Default for GainPredictor {
    fn default() -> Self {
        Self {
            past_qua_en: [PAST_QUA_EN_RESET; 4],
        }
    }
}

impl GainPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicted fixed codebook gain for `code` (Q13)
    ///
    /// Returns the mantissa and its Q format; the mantissa lies in
    /// `16384..=32767`.
    pub fn predict(&self, code: &[Word16]) -> (Word16, Word16) {
        let mut l_tmp = 0;
        for &c in code.iter().take(L_SUBFR) {
            l_tmp = l_mac(l_tmp, c, c);
        }

        // 127.298 - 3.0103 * log2(ener_code), Q14
        let (exp, frac) = log2(l_tmp);
        let mut l_tmp = mpy_32_16(exp, frac, -24660);
        l_tmp = l_mac(l_tmp, 32588, 32);

        l_tmp = l_shl(l_tmp, 10);
        for i in 0..4 {
            l_tmp = l_mac(l_tmp, PRED[i], self.past_qua_en[i]);
        }
        let gcode0 = extract_h(l_tmp);

        // 10^(gcode0/20) = 2^(0.166 * gcode0)
        let l_tmp = l_shr(l_mult(gcode0, 5439), 8);
        let (exp, frac) = l_extract(l_tmp);

        let gcode0 = extract_l(pow2(14, frac));
        (gcode0, sub(14, exp))
    }

    /// Push the energy of the quantized correction factor `l_gbk12` (Q13)
    pub fn update(&mut self, l_gbk12: Word32) {
        self.past_qua_en.copy_within(0..3, 1);

        // 20 * log10(gbk12)
        let (exp, frac) = log2(l_gbk12);
        let l_acc = l_comp(sub(exp, 13), frac);
        let tmp = extract_h(l_shl(l_acc, 13));
        self.past_qua_en[0] = mult(tmp, 24660);
    }

    /// Push the average past energy lowered by 4 dB, floored at -14 dB
    pub fn update_erasure(&mut self) {
        let mut l_tmp = 0;
        for &e in self.past_qua_en.iter() {
            l_tmp = l_add(l_tmp, l_deposit_l(e));
        }
        let mut av_pred_en = extract_l(l_shr(l_tmp, 2));
        av_pred_en = sub(av_pred_en, 4096);
        if av_pred_en < PAST_QUA_EN_RESET {
            av_pred_en = PAST_QUA_EN_RESET;
        }

        self.past_qua_en.copy_within(0..3, 1);
        self.past_qua_en[0] = av_pred_en;
    }

    /// Past quantized energies, Q10, newest first
    #[cfg(test)]
    pub fn past_energies(&self) -> &[Word16; 4] {
        &self.past_qua_en
    }
}

/// Gain correction factor `gbk1[i1][1] + gbk2[i2][1]`, Q13
#[inline]
fn gbk12(index1: usize, index2: usize) -> Word32 {
    l_add(l_deposit_l(GBK1[index1][1]), l_deposit_l(GBK2[index2][1]))
}

/// Fixed codebook gain in Q1 from the correction factor and the prediction
#[inline]
fn code_gain(l_gbk12: Word32, gcode0: Word16, exp_gcode0: Word16) -> Word16 {
    let tmp = extract_l(l_shr(l_gbk12, 1));
    let l_acc = l_mult(tmp, gcode0);
    let l_acc = l_shl(l_acc, add(negate(exp_gcode0), -12 - 1 + 1 + 16));
    extract_h(l_acc)
}

/// Gain quantizer of the encoder
#[derive(Debug, Clone, Default)]
pub struct GainQuantizer {
    predictor: GainPredictor,
}

impl GainQuantizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jointly quantize the pitch and fixed codebook gains
    ///
    /// # Arguments
    /// * `code` - Fixed codeword, Q13
    /// * `g_coeff` - `<y1,y1>`, `-2<xn,y1>`, `<y2,y2>`, `-2<xn,y2>`, `2<y1,y2>`
    /// * `exp_coeff` - Q formats of `g_coeff`
    /// * `tame` - Limit the pitch gain to avoid filter instability
    ///
    /// Returns the 7-bit index (3 bits of the first stage above 4 bits of
    /// the second), the pitch gain in Q14 and the code gain in Q1.
    pub fn quantize(
        &mut self,
        code: &[Word16],
        g_coeff: &[Word16; 5],
        exp_coeff: &[Word16; 5],
        tame: bool,
    ) -> (Word16, Word16, Word16) {
        let (gcode0, exp_gcode0) = self.predictor.predict(code);

        // tmp = -1 / (4*c0*c2 - c4^2)
        let l_tmp1 = l_mult(g_coeff[0], g_coeff[2]);
        let exp1 = add(add(exp_coeff[0], exp_coeff[2]), 1 - 2);
        let l_tmp2 = l_mult(g_coeff[4], g_coeff[4]);
        let exp2 = add(add(exp_coeff[4], exp_coeff[4]), 1);

        let (l_tmp, exp) = if exp1 > exp2 {
            (l_sub(l_shr(l_tmp1, sub(exp1, exp2)), l_tmp2), exp2)
        } else {
            (l_sub(l_tmp1, l_shr(l_tmp2, sub(exp2, exp1))), exp1)
        };
        let sft = norm_l(l_tmp);
        let denom = extract_h(l_shl(l_tmp, sft));
        let exp_denom = sub(add(exp, sft), 16);

        let inv_denom = negate(div_s(16384, denom));
        let exp_inv_denom = sub(14 + 15, exp_denom);

        // best_gain[0] = (2*c2*c1 - c3*c4) * tmp, Q9
        let mut best_gain = [0; 2];
        let nume_of = |a: Word16, ea: Word16, b: Word16, eb: Word16, c: Word16, ec: Word16| {
            let l_tmp1 = l_mult(a, b);
            let exp1 = add(ea, eb);
            let l_tmp2 = l_mult(c, g_coeff[4]);
            let exp2 = add(add(ec, exp_coeff[4]), 1);
            let (l_tmp, exp) = if exp1 > exp2 {
                (
                    l_sub(l_shr(l_tmp1, add(sub(exp1, exp2), 1)), l_shr(l_tmp2, 1)),
                    sub(exp2, 1),
                )
            } else {
                (
                    l_sub(l_shr(l_tmp1, 1), l_shr(l_tmp2, add(sub(exp2, exp1), 1))),
                    sub(exp1, 1),
                )
            };
            let sft = norm_l(l_tmp);
            let nume = extract_h(l_shl(l_tmp, sft));
            (nume, sub(add(exp, sft), 16))
        };

        let (nume, exp_nume) = nume_of(
            g_coeff[2],
            exp_coeff[2],
            g_coeff[1],
            exp_coeff[1],
            g_coeff[3],
            exp_coeff[3],
        );
        let sft = sub(add(exp_nume, exp_inv_denom), 9 + 16 - 1);
        best_gain[0] = extract_h(l_shr(l_mult(nume, inv_denom), sft));

        if tame && best_gain[0] > GPCLIP2 {
            best_gain[0] = GPCLIP2;
        }

        // best_gain[1] = (2*c0*c3 - c1*c4) * tmp, Q2
        let (nume, exp_nume) = nume_of(
            g_coeff[0],
            exp_coeff[0],
            g_coeff[3],
            exp_coeff[3],
            g_coeff[1],
            exp_coeff[1],
        );
        let sft = sub(add(exp_nume, exp_inv_denom), 2 + 16 - 1);
        best_gain[1] = extract_h(l_shr(l_mult(nume, inv_denom), sft));

        // gcode0 in Q4
        let gcode0_org = if exp_gcode0 >= 4 {
            shr(gcode0, sub(exp_gcode0, 4))
        } else {
            let l_acc = l_shl(l_deposit_l(gcode0), sub(4 + 16, exp_gcode0));
            extract_h(l_acc)
        };

        let (cand1, cand2) = gbk_presel(&best_gain, gcode0_org);

        // Align the terms of the distortion
        let mut exp_min = [
            add(exp_coeff[0], 13),
            add(exp_coeff[1], 14),
            add(exp_coeff[2], sub(shl(exp_gcode0, 1), 21)),
            add(exp_coeff[3], sub(exp_gcode0, 3)),
            add(exp_coeff[4], sub(exp_gcode0, 4)),
        ];
        let e_min = exp_min.iter().copied().fold(exp_min[0], Word16::min);
        let mut coeff = [0; 5];
        let mut coeff_lsf = [0; 5];
        for i in 0..5 {
            exp_min[i] = sub(exp_min[i], e_min);
            let l_tmp = l_shr(l_deposit_h(g_coeff[i]), exp_min[i]);
            (coeff[i], coeff_lsf[i]) = l_extract(l_tmp);
        }

        let mut l_dist_min = MAX_32;
        let mut index1 = cand1;
        let mut index2 = cand2;
        for i in 0..NCAN1 {
            for j in 0..NCAN2 {
                let g_pitch = add(GBK1[cand1 + i][0], GBK2[cand2 + j][0]);
                if tame && g_pitch >= GP0999 {
                    continue;
                }
                let tmp = extract_l(l_shr(gbk12(cand1 + i, cand2 + j), 1));

                let g_code = mult(gcode0, tmp);
                let g2_pitch = mult(g_pitch, g_pitch);
                let g2_code = mult(g_code, g_code);
                let g_pit_cod = mult(g_code, g_pitch);

                let mut l_tmp = mpy_32_16(coeff[0], coeff_lsf[0], g2_pitch);
                l_tmp = l_add(l_tmp, mpy_32_16(coeff[1], coeff_lsf[1], g_pitch));
                l_tmp = l_add(l_tmp, mpy_32_16(coeff[2], coeff_lsf[2], g2_code));
                l_tmp = l_add(l_tmp, mpy_32_16(coeff[3], coeff_lsf[3], g_code));
                l_tmp = l_add(l_tmp, mpy_32_16(coeff[4], coeff_lsf[4], g_pit_cod));

                if l_sub(l_tmp, l_dist_min) < 0 {
                    l_dist_min = l_tmp;
                    index1 = cand1 + i;
                    index2 = cand2 + j;
                }
            }
        }

        let gain_pit = add(GBK1[index1][0], GBK2[index2][0]);
        let l_gbk12 = gbk12(index1, index2);
        let gain_cod = code_gain(l_gbk12, gcode0, exp_gcode0);

        self.predictor.update(l_gbk12);

        let index = add(MAP1[index1] * NCODE2 as Word16, MAP2[index2]);
        (index, gain_pit, gain_cod)
    }

    #[cfg(test)]
    pub fn predictor(&self) -> &GainPredictor {
        &self.predictor
    }
}

/// Pre-selection of `NCAN1` x `NCAN2` codebook candidates around the
/// unquantized optimum
fn gbk_presel(best_gain: &[Word16; 2], gcode0: Word16) -> (usize, usize) {
    // x = (best_gain[1] - (coef[0][0]*best_gain[0] + coef[1][1]) * gcode0) * inv_coef
    let l_cfbg = l_mult(COEF[0][0], best_gain[0]);
    let mut l_acc = l_shr(L_COEF[1][1], 15);
    l_acc = l_add(l_cfbg, l_acc);
    let acc_h = extract_h(l_acc);
    let l_preg = l_mult(acc_h, gcode0);
    let mut l_acc = l_shl(l_deposit_l(best_gain[1]), 7);
    l_acc = l_sub(l_acc, l_preg);
    let acc_h = extract_h(l_shl(l_acc, 2));
    let l_tmp_x = l_mult(acc_h, INV_COEF);

    // y = (coef[1][0]*(-coef[0][1] + best_gain[0]*coef[0][0])*gcode0
    //      - coef[0][0]*best_gain[1]) * inv_coef
    let l_acc = l_sub(l_cfbg, l_shr(L_COEF[0][1], 10));
    let acc_h = mult(extract_h(l_acc), gcode0);
    let l_tmp = l_mult(acc_h, COEF[1][0]);
    let l_preg = l_mult(COEF[0][0], best_gain[1]);
    let l_acc = l_sub(l_tmp, l_shr(l_preg, 3));
    let acc_h = extract_h(l_shl(l_acc, 2));
    let l_tmp_y = l_mult(acc_h, INV_COEF);

    let sft_y: Word16 = (14 + 4 + 1) - 16;
    let sft_x: Word16 = (15 + 4 + 1) - 15;

    let mut cand1 = 0;
    let mut cand2 = 0;
    if gcode0 > 0 {
        while cand1 < NCODE1 - NCAN1
            && l_sub(l_tmp_y, l_shr(l_mult(THR1[cand1], gcode0), sft_y)) > 0
        {
            cand1 += 1;
        }
        while cand2 < NCODE2 - NCAN2
            && l_sub(l_tmp_x, l_shr(l_mult(THR2[cand2], gcode0), sft_x)) > 0
        {
            cand2 += 1;
        }
    } else {
        while cand1 < NCODE1 - NCAN1
            && l_sub(l_tmp_y, l_shr(l_mult(THR1[cand1], gcode0), sft_y)) < 0
        {
            cand1 += 1;
        }
        while cand2 < NCODE2 - NCAN2
            && l_sub(l_tmp_x, l_shr(l_mult(THR2[cand2], gcode0), sft_x)) < 0
        {
            cand2 += 1;
        }
    }
    (cand1, cand2)
}

/// Gain decoder with erasure concealment
#[derive(Debug, Clone, Default)]
pub struct GainDecoder {
    predictor: GainPredictor,
}

impl GainDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the gains of one subframe
    ///
    /// On an erased subframe the previous gains (passed in `gain_pit` and
    /// `gain_cod`) are attenuated: the pitch gain by 0.9 and the code gain
    /// by 0.98.
    pub fn decode(
        &mut self,
        index: Word16,
        code: &[Word16],
        bfi: bool,
        gain_pit: &mut Word16,
        gain_cod: &mut Word16,
    ) {
        if bfi {
            *gain_pit = mult(*gain_pit, 29491);
            if *gain_pit > 29491 {
                *gain_pit = 29491;
            }
            *gain_cod = mult(*gain_cod, 32111);
            self.predictor.update_erasure();
            return;
        }

        let index1 = IMAP1[(shr(index, NCODE2_B) as usize) & (NCODE1 - 1)] as usize;
        let index2 = IMAP2[(index as usize) & (NCODE2 - 1)] as usize;
        *gain_pit = add(GBK1[index1][0], GBK2[index2][0]);

        let (gcode0, exp_gcode0) = self.predictor.predict(code);
        let l_gbk12 = gbk12(index1, index2);
        *gain_cod = code_gain(l_gbk12, gcode0, exp_gcode0);

        self.predictor.update(l_gbk12);
    }

    #[cfg(test)]
    pub fn predictor(&self) -> &GainPredictor {
        &self.predictor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::g729::acelp::decod_acelp;

    fn codeword() -> [Word16; L_SUBFR] {
        let mut code = [0; L_SUBFR];
        decod_acelp(0b0101, 0x0a53, &mut code);
        code
    }

    #[test]
    fn test_prediction_from_reset_state() {
        let pred = GainPredictor::new();
        let (g, e) = pred.predict(&codeword());
        assert!((16384..=32767).contains(&g), "{g}");
        assert!(e > 0);
    }

    #[test]
    fn test_update_tracks_correction_energy() {
        let mut pred = GainPredictor::new();
        // unit correction factor gives 0 dB
        pred.update(8192);
        assert!(pred.past_energies()[0].abs() < 16, "{:?}", pred.past_energies());
        assert_eq!(pred.past_energies()[1], PAST_QUA_EN_RESET);
    }

    #[test]
    fn test_erasure_update_decays_and_floors() {
        let mut pred = GainPredictor::new();
        pred.update_erasure();
        assert_eq!(pred.past_energies(), &[PAST_QUA_EN_RESET; 4]);

        let mut pred = GainPredictor::new();
        for _ in 0..4 {
            pred.update(16384);
        }
        let before = pred.past_energies()[0];
        pred.update_erasure();
        assert!(pred.past_energies()[0] < before);
    }

    #[test]
    fn test_encoder_and_decoder_agree() {
        let code = codeword();
        let mut enc = GainQuantizer::new();
        let mut dec = GainDecoder::new();

        let cases: [([Word16; 5], [Word16; 5]); 3] = [
            ([16000, -12000, 20000, -15000, 9000], [8, 6, 12, 8, 10]),
            ([20000, -30000, 18000, -9000, 4000], [9, 8, 13, 7, 10]),
            ([12000, -2000, 25000, -20000, 1000], [7, 4, 12, 9, 9]),
        ];
        for (g_coeff, exp_coeff) in cases.iter() {
            let (index, gp, gc) = enc.quantize(&code, g_coeff, exp_coeff, false);
            assert!((0..128).contains(&index));
            let (mut dgp, mut dgc) = (0, 0);
            dec.decode(index, &code, false, &mut dgp, &mut dgc);
            assert_eq!((dgp, dgc), (gp, gc));
        }
        assert_eq!(enc.predictor().past_energies(), dec.predictor().past_energies());
    }

    #[test]
    fn test_taming_limits_pitch_gain() {
        let code = codeword();
        let mut enc = GainQuantizer::new();
        let (_, gp, _) = enc.quantize(
            &code,
            &[20000, -30000, 18000, -9000, 4000],
            &[9, 8, 13, 7, 10],
            true,
        );
        assert!(gp < GP0999);
    }

    #[test]
    fn test_erased_gains_attenuate() {
        let code = codeword();
        let mut dec = GainDecoder::new();
        let (mut gp, mut gc) = (16384, 1000);
        dec.decode(0, &code, true, &mut gp, &mut gc);
        assert_eq!(gp, mult(16384, 29491));
        assert_eq!(gc, mult(1000, 32111));
    }
}
