//! LSF quantizer of SID frames
//!
//! Reuses the speech codebooks through subset tables: 32 first stage and
//! 16 second stage entries, searched as a tree with 4 survivors over both
//! noise MA predictors.

use super::basic_op::*;
use super::constants::{GAP3, L_LIMIT, M, MODE, M_LIMIT, NC, NB_LSF_CANDIDATES};
use super::lsp::{lsf_lsp2, lsp_lsf2};
use super::lsp_quant::{
    get_wegt, lsp_expand, lsp_prev_compose, lsp_prev_extract, lsp_prev_update, lsp_stability,
    FreqPrev,
};
use super::tables::{LSPCB1, LSPCB2};
use super::tables_dtx::{MP, NOISE_FG, NOISE_FG_SUM, NOISE_FG_SUM_INV, PTR_TAB_1, PTR_TAB_2};

const MQ1: usize = PTR_TAB_1.len();
const MQ2: usize = PTR_TAB_2[0].len();

/// Second stage codeword selected by subset index `m`
#[inline]
fn stage2(m: usize, l: usize) -> Word16 {
    let half = if l < NC { 0 } else { 1 };
    LSPCB2[PTR_TAB_2[half][m] as usize][l]
}

/// Pick the `k` smallest entries of `sum`, first found wins on ties
fn select_candidates(sum: &mut [Word16], mq: usize, k: usize) -> Vec<(usize, usize)> {
    let mut picked = Vec::with_capacity(k);
    for _ in 0..k {
        let mut min = MAX_16;
        let mut best = (0, 0);
        for (n, &s) in sum.iter().enumerate() {
            if s < min {
                min = s;
                best = (n / mq, n % mq);
            }
        }
        sum[best.0 * mq + best.1] = MAX_16;
        picked.push(best);
    }
    picked
}

/// Quantize the LSPs of a SID frame
///
/// # Arguments
/// * `lsp_new` - Unquantized LSPs, Q15
/// * `lspq` - Output quantized LSPs, Q15
/// * `freq_prev` - MA predictor memory shared with the speech quantizer
/// * `ana` - Output indices: predictor, first stage, second stage
pub fn lsfq_noise(
    lsp_new: &[Word16; M],
    lspq: &mut [Word16; M],
    freq_prev: &mut FreqPrev,
    ana: &mut [Word16; 3],
) {
    let mut lsf = [0; M];
    lsp_lsf2(lsp_new, &mut lsf);

    // spacing to about 100 Hz
    if lsf[0] < L_LIMIT {
        lsf[0] = L_LIMIT;
    }
    for i in 0..M - 1 {
        if sub(lsf[i + 1], lsf[i]) < 2 * GAP3 {
            lsf[i + 1] = add(lsf[i], 2 * GAP3);
        }
    }
    if lsf[M - 1] > M_LIMIT {
        lsf[M - 1] = M_LIMIT;
    }
    if lsf[M - 1] < lsf[M - 2] {
        lsf[M - 2] = sub(lsf[M - 1], GAP3);
    }

    let mut weight = [0; M];
    get_wegt(&lsf, &mut weight);

    let mut errlsf = [[0; M]; MODE];
    for mode in 0..MODE {
        lsp_prev_extract(
            &lsf,
            &mut errlsf[mode],
            &NOISE_FG[mode],
            freq_prev,
            &NOISE_FG_SUM_INV[mode],
        );
    }

    let (mode, c1, c2) = tree_search(&errlsf, &weight);
    ana[0] = mode as Word16;
    ana[1] = c1 as Word16;
    ana[2] = c2 as Word16;

    let mut tmpbuf = [0; M];
    for l in 0..M {
        tmpbuf[l] = add(LSPCB1[PTR_TAB_1[c1] as usize][l], stage2(c2, l));
    }
    lsp_expand(&mut tmpbuf, 10, 1..M);

    let mut lsfq = [0; M];
    lsp_prev_compose(&tmpbuf, &mut lsfq, &NOISE_FG[mode], freq_prev, &NOISE_FG_SUM[mode]);
    lsp_prev_update(&tmpbuf, freq_prev);
    lsp_stability(&mut lsfq);
    lsf_lsp2(&lsfq, lspq);
}

/// Two stage tree search; returns predictor, first and second stage index
fn tree_search(errlsf: &[[Word16; M]; MODE], weight: &[Word16; M]) -> (usize, usize, usize) {
    // stage 1: plain error scaled by the predictor's mean power
    let mut sum = [0; MODE * MQ1];
    for p in 0..MODE {
        for m in 0..MQ1 {
            let cb = &LSPCB1[PTR_TAB_1[m] as usize];
            let mut acc0 = 0;
            for l in 0..M {
                let tmp = sub(errlsf[p][l], cb[l]);
                acc0 = l_mac(acc0, tmp, tmp);
            }
            sum[p * MQ1 + m] = mult(extract_h(acc0), MP[p]);
        }
    }
    let first = select_candidates(&mut sum, MQ1, NB_LSF_CANDIDATES);

    let mut d_data = [[0; M]; NB_LSF_CANDIDATES];
    for (q, &(p, m)) in first.iter().enumerate() {
        let cb = &LSPCB1[PTR_TAB_1[m] as usize];
        for l in 0..M {
            d_data[q][l] = sub(errlsf[p][l], cb[l]);
        }
    }

    // stage 2: weighted error over the survivors
    let mut sum = [0; NB_LSF_CANDIDATES * MQ2];
    for (p, &(mode, _)) in first.iter().enumerate() {
        for m in 0..MQ2 {
            let mut acc0 = 0;
            for l in 0..M {
                let fg = NOISE_FG_SUM[mode][l];
                let tmp1 = extract_h(l_shl(l_mult(fg, fg), 2));
                let tmp1 = mult(tmp1, weight[l]);
                let tmp2 = sub(d_data[p][l], stage2(m, l));
                let tmp1 = extract_h(l_shl(l_mult(tmp1, tmp2), 3));
                acc0 = l_mac(acc0, tmp1, tmp2);
            }
            sum[p * MQ2 + m] = extract_h(acc0);
        }
    }
    let (q, c2) = select_candidates(&mut sum, MQ2, 1)[0];
    let (mode, c1) = first[q];
    (mode, c1, c2)
}

/// Decode the LSPs of a SID frame
pub fn sid_lsfq_decode(index: &[Word16; 3], lspq: &mut [Word16; M], freq_prev: &mut FreqPrev) {
    let mode = (index[0] & 1) as usize;
    let c1 = (index[1] as usize) % MQ1;
    let c2 = (index[2] as usize) % MQ2;

    let mut tmpbuf = [0; M];
    for l in 0..M {
        tmpbuf[l] = add(LSPCB1[PTR_TAB_1[c1] as usize][l], stage2(c2, l));
    }

    for j in 1..M {
        let mut acc0 = l_mult(tmpbuf[j - 1], 16384);
        acc0 = l_mac(acc0, tmpbuf[j], -16384);
        acc0 = l_mac(acc0, 10, 16384);
        let k = extract_h(acc0);
        if k > 0 {
            tmpbuf[j - 1] = sub(tmpbuf[j - 1], k);
            tmpbuf[j] = add(tmpbuf[j], k);
        }
    }

    let mut lsfq = [0; M];
    lsp_prev_compose(&tmpbuf, &mut lsfq, &NOISE_FG[mode], freq_prev, &NOISE_FG_SUM[mode]);
    lsp_prev_update(&tmpbuf, freq_prev);
    lsp_stability(&mut lsfq);
    lsf_lsp2(&lsfq, lspq);
}
