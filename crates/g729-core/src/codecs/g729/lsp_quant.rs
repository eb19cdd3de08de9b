//! Switched MA-predictive two-stage LSF quantizer
//!
//! The encoder searches both MA predictors and keeps the one with the lower
//! weighted distortion. The decoder mirrors the index to codeword mapping and
//! keeps enough history to conceal erased frames.

use super::basic_op::*;
use super::constants::{
    GAP1, GAP2, GAP3, L_LIMIT, M, M_LIMIT, MA_NP, MODE, NC, NC0, NC0_B, NC1, NC1_B,
};
use super::lsp::{lsf_lsp2, lsp_lsf2};
use super::tables::{FG, FG_SUM, FG_SUM_INV, FREQ_PREV_RESET, LSPCB1, LSPCB2};
use tracing::warn;

/// MA predictor memory: quantized LSF residuals of the last four frames, Q13
pub type FreqPrev = [[Word16; M]; MA_NP];

/// 0.04*pi in Q13
const PI04: Word16 = 1029;
/// 0.92*pi in Q13
const PI92: Word16 = 23677;
/// 10.0 in Q11
const CONST10: Word16 = 0x5000;
/// 1.2 in Q14
const CONST12: Word16 = 19661;

pub(crate) fn freq_prev_reset() -> FreqPrev {
    [FREQ_PREV_RESET; MA_NP]
}

/// LSP quantizer state of the encoder
#[derive(Debug, Clone)]
pub struct LspQuantizer {
    freq_prev: FreqPrev,
}

impl Default for LspQuantizer {
    fn default() -> Self {
        Self {
            freq_prev: freq_prev_reset(),
        }
    }
}

impl LspQuantizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantize one LSP vector
    ///
    /// # Arguments
    /// * `lsp` - Unquantized LSPs, Q15
    /// * `lsp_q` - Output quantized LSPs, Q15
    /// * `ana` - Output indices: `[mode<<7 | L1, L2<<5 | L3]`
    pub fn quantize(&mut self, lsp: &[Word16; M], lsp_q: &mut [Word16; M], ana: &mut [Word16; 2]) {
        let mut lsf = [0; M];
        let mut lsf_q = [0; M];

        lsp_lsf2(lsp, &mut lsf);
        let mut wegt = [0; M];
        get_wegt(&lsf, &mut wegt);
        self.relspwed(&lsf, &wegt, &mut lsf_q, ana);
        lsf_lsp2(&lsf_q, lsp_q);
    }

    /// Predictor memory shared with the SID quantizer
    pub(crate) fn freq_prev_mut(&mut self) -> &mut FreqPrev {
        &mut self.freq_prev
    }

    fn relspwed(
        &mut self,
        lsp: &[Word16; M],
        wegt: &[Word16; M],
        lspq: &mut [Word16; M],
        code_ana: &mut [Word16; 2],
    ) {
        let mut cand = [0usize; MODE];
        let mut tindex1 = [0usize; MODE];
        let mut tindex2 = [0usize; MODE];
        let mut l_tdist = [0; MODE];
        let mut rbuf = [0; M];
        let mut buf = [0; M];

        for mode in 0..MODE {
            lsp_prev_extract(lsp, &mut rbuf, &FG[mode], &self.freq_prev, &FG_SUM_INV[mode]);

            let cand_cur = lsp_pre_select(&rbuf);
            cand[mode] = cand_cur;

            let index = lsp_select(&rbuf, &LSPCB1[cand_cur], wegt, 0..NC);
            tindex1[mode] = index;
            for j in 0..NC {
                buf[j] = add(LSPCB1[cand_cur][j], LSPCB2[index][j]);
            }
            lsp_expand(&mut buf, GAP1, 1..NC);

            let index = lsp_select(&rbuf, &LSPCB1[cand_cur], wegt, NC..M);
            tindex2[mode] = index;
            for j in NC..M {
                buf[j] = add(LSPCB1[cand_cur][j], LSPCB2[index][j]);
            }
            lsp_expand(&mut buf, GAP1, NC..M);
            lsp_expand(&mut buf, GAP2, 1..M);

            l_tdist[mode] = lsp_get_tdist(wegt, &buf, &rbuf, &FG_SUM[mode]);
        }

        let mode_index = if l_sub(l_tdist[1], l_tdist[0]) < 0 { 1 } else { 0 };

        code_ana[0] = ((mode_index << NC0_B) | cand[mode_index]) as Word16;
        code_ana[1] = ((tindex1[mode_index] << NC1_B) | tindex2[mode_index]) as Word16;

        lsp_get_quant(
            cand[mode_index],
            tindex1[mode_index],
            tindex2[mode_index],
            &FG[mode_index],
            &mut self.freq_prev,
            lspq,
            &FG_SUM[mode_index],
        );
    }
}

/// LSP dequantizer state of the decoder
#[derive(Debug, Clone)]
pub struct LspDecoder {
    freq_prev: FreqPrev,
    prev_lsp: [Word16; M],
    prev_ma: usize,
}

impl Default for LspDecoder {
    fn default() -> Self {
        Self {
            freq_prev: freq_prev_reset(),
            prev_lsp: FREQ_PREV_RESET,
            prev_ma: 0,
        }
    }
}

impl LspDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the LSPs of one frame
    ///
    /// On an erased frame the last good LSF vector is repeated and the
    /// predictor memory is advanced as if it had been received again.
    pub fn decode(&mut self, prm: [Word16; 2], lsp_q: &mut [Word16; M], erase: bool) {
        let mut lsf_q = [0; M];

        if !erase {
            let mode_index = (shr(prm[0], NC0_B as Word16) & 1) as usize;
            let code0 = (prm[0] & (NC0 as Word16 - 1)) as usize;
            let code1 = (shr(prm[1], NC1_B as Word16) & (NC1 as Word16 - 1)) as usize;
            let code2 = (prm[1] & (NC1 as Word16 - 1)) as usize;

            lsp_get_quant(
                code0,
                code1,
                code2,
                &FG[mode_index],
                &mut self.freq_prev,
                &mut lsf_q,
                &FG_SUM[mode_index],
            );

            self.prev_lsp = lsf_q;
            self.prev_ma = mode_index;
        } else {
            lsf_q = self.prev_lsp;

            let mut buf = [0; M];
            lsp_prev_extract(
                &self.prev_lsp,
                &mut buf,
                &FG[self.prev_ma],
                &self.freq_prev,
                &FG_SUM_INV[self.prev_ma],
            );
            lsp_prev_update(&buf, &mut self.freq_prev);
        }

        lsf_lsp2(&lsf_q, lsp_q);
    }

    /// Predictor memory shared with the SID decoder
    pub(crate) fn freq_prev_mut(&mut self) -> &mut FreqPrev {
        &mut self.freq_prev
    }
}

/// Perceptual weights of the LSF distortion, normalized
pub(crate) fn get_wegt(flsp: &[Word16; M], wegt: &mut [Word16; M]) {
    let mut buf = [0; M];

    buf[0] = sub(flsp[1], PI04 + 8192);
    for i in 1..M - 1 {
        let tmp = sub(flsp[i + 1], flsp[i - 1]);
        buf[i] = sub(tmp, 8192);
    }
    buf[M - 1] = sub(PI92 - 8192, flsp[M - 2]);

    for i in 0..M {
        if buf[i] > 0 {
            wegt[i] = 2048;
        } else {
            let l_acc = l_mult(buf[i], buf[i]);
            let tmp = extract_h(l_shl(l_acc, 2));
            let l_acc = l_mult(tmp, CONST10);
            let tmp = extract_h(l_shl(l_acc, 2));
            wegt[i] = add(tmp, 2048);
        }
    }

    wegt[4] = extract_h(l_shl(l_mult(wegt[4], CONST12), 1));
    wegt[5] = extract_h(l_shl(l_mult(wegt[5], CONST12), 1));

    let mut tmp = 0;
    for &w in wegt.iter() {
        if w > tmp {
            tmp = w;
        }
    }
    let sft = norm_s(tmp);
    for w in wegt.iter_mut() {
        *w = shl(*w, sft);
    }
}

/// Remove the MA prediction: `lsp_ele = (lsp - sum(fg*freq_prev)) / fg_sum`
pub(crate) fn lsp_prev_extract(
    lsp: &[Word16; M],
    lsp_ele: &mut [Word16; M],
    fg: &[[Word16; M]; MA_NP],
    freq_prev: &FreqPrev,
    fg_sum_inv: &[Word16; M],
) {
    for j in 0..M {
        let mut l_temp = l_deposit_h(lsp[j]);
        for k in 0..MA_NP {
            l_temp = l_msu(l_temp, freq_prev[k][j], fg[k][j]);
        }
        let temp = extract_h(l_temp);
        let l_temp = l_mult(temp, fg_sum_inv[j]);
        lsp_ele[j] = extract_h(l_shl(l_temp, 3));
    }
}

/// Add the MA prediction: `lsp = lsp_ele*fg_sum + sum(fg*freq_prev)`
pub(crate) fn lsp_prev_compose(
    lsp_ele: &[Word16; M],
    lsp: &mut [Word16; M],
    fg: &[[Word16; M]; MA_NP],
    freq_prev: &FreqPrev,
    fg_sum: &[Word16; M],
) {
    for j in 0..M {
        let mut l_acc = l_mult(lsp_ele[j], fg_sum[j]);
        for k in 0..MA_NP {
            l_acc = l_mac(l_acc, freq_prev[k][j], fg[k][j]);
        }
        lsp[j] = extract_h(l_acc);
    }
}

/// Shift the predictor memory and store the newest residual
pub(crate) fn lsp_prev_update(lsp_ele: &[Word16; M], freq_prev: &mut FreqPrev) {
    for k in (1..MA_NP).rev() {
        freq_prev[k] = freq_prev[k - 1];
    }
    freq_prev[0] = *lsp_ele;
}

/// Nearest first stage entry, plain squared error
fn lsp_pre_select(rbuf: &[Word16; M]) -> usize {
    let mut cand = 0;
    let mut l_dmin = MAX_32;
    for (i, cb) in LSPCB1.iter().enumerate() {
        let mut l_tmp = 0;
        for j in 0..M {
            let tmp = sub(rbuf[j], cb[j]);
            l_tmp = l_mac(l_tmp, tmp, tmp);
        }
        if l_sub(l_tmp, l_dmin) < 0 {
            l_dmin = l_tmp;
            cand = i;
        }
    }
    cand
}

/// Nearest second stage entry over one half of the vector, weighted error
fn lsp_select(
    rbuf: &[Word16; M],
    lspcb1: &[Word16; M],
    wegt: &[Word16; M],
    half: std::ops::Range<usize>,
) -> usize {
    let mut buf = [0; M];
    for j in half.clone() {
        buf[j] = sub(rbuf[j], lspcb1[j]);
    }

    let mut index = 0;
    let mut l_dmin = MAX_32;
    for (k1, cb) in LSPCB2.iter().enumerate() {
        let mut l_dist = 0;
        for j in half.clone() {
            let tmp = sub(buf[j], cb[j]);
            let tmp2 = mult(wegt[j], tmp);
            l_dist = l_mac(l_dist, tmp2, tmp);
        }
        if l_sub(l_dist, l_dmin) < 0 {
            l_dmin = l_dist;
            index = k1;
        }
    }
    index
}

/// Pull neighbours apart until each pair in `range` is at least `gap` apart
pub(crate) fn lsp_expand(buf: &mut [Word16; M], gap: Word16, range: std::ops::Range<usize>) {
    for j in range {
        let diff = sub(buf[j - 1], buf[j]);
        let tmp = shr(add(diff, gap), 1);
        if tmp > 0 {
            buf[j - 1] = sub(buf[j - 1], tmp);
            buf[j] = add(buf[j], tmp);
        }
    }
}

fn lsp_get_tdist(
    wegt: &[Word16; M],
    buf: &[Word16; M],
    rbuf: &[Word16; M],
    fg_sum: &[Word16; M],
) -> Word32 {
    let mut l_tdist = 0;
    for j in 0..M {
        let tmp = sub(buf[j], rbuf[j]);
        let tmp = mult(tmp, fg_sum[j]);
        let l_acc = l_mult(wegt[j], tmp);
        let tmp2 = extract_h(l_shl(l_acc, 4));
        l_tdist = l_mac(l_tdist, tmp2, tmp);
    }
    l_tdist
}

fn lsp_get_quant(
    code0: usize,
    code1: usize,
    code2: usize,
    fg: &[[Word16; M]; MA_NP],
    freq_prev: &mut FreqPrev,
    lspq: &mut [Word16; M],
    fg_sum: &[Word16; M],
) {
    let mut buf = [0; M];
    for j in 0..NC {
        buf[j] = add(LSPCB1[code0][j], LSPCB2[code1][j]);
    }
    for j in NC..M {
        buf[j] = add(LSPCB1[code0][j], LSPCB2[code2][j]);
    }

    lsp_expand(&mut buf, GAP1, 1..M);
    lsp_expand(&mut buf, GAP2, 1..M);

    lsp_prev_compose(&buf, lspq, fg, freq_prev, fg_sum);
    lsp_prev_update(&buf, freq_prev);
    lsp_stability(lspq);
}

/// Enforce ordering, bounds and minimum spacing of a quantized LSF vector
///
/// A single bubble pass reorders adjacent inversions, the first value is
/// floored, every gap is widened to at least 0.0392 and the last value is
/// capped.
pub fn lsp_stability(buf: &mut [Word16; M]) {
    for j in 0..M - 1 {
        if l_sub(l_deposit_l(buf[j + 1]), l_deposit_l(buf[j])) < 0 {
            buf.swap(j, j + 1);
        }
    }

    if buf[0] < L_LIMIT {
        buf[0] = L_LIMIT;
        warn!("LSF stability: first LSF raised to the floor");
    }

    for j in 0..M - 1 {
        let l_diff = l_sub(l_deposit_l(buf[j + 1]), l_deposit_l(buf[j]));
        if l_sub(l_diff, GAP3 as Word32) < 0 {
            buf[j + 1] = add(buf[j], GAP3);
        }
    }

    if buf[M - 1] > M_LIMIT {
        buf[M - 1] = M_LIMIT;
        warn!("LSF stability: last LSF lowered to the ceiling");
    }
}
