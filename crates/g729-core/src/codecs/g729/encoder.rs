//! G.729A encoder with the Annex B silence compression
//!
//! Every 10 ms frame runs LP analysis on a 240-sample window, quantizes the
//! LSPs, and for each 5 ms subframe searches the adaptive codebook around
//! the open-loop lag, then the algebraic codebook, and quantizes both gains
//! jointly. When silence suppression is on, frames the VAD classifies as
//! noise are handed to the DTX state instead.

use super::acelp::acelp_code_a;
use super::basic_op::*;
use super::bitstream::{pack_sid, pack_speech, SidParams, SpeechParams};
use super::config::{CnPayloadFormat, G729Config};
use super::constants::{
    EXC_HIST, GAMMA1, GPCLIP, INIT_SEED, L_FRAME, L_NEXT, L_SUBFR, L_TOTAL, L_WINDOW, M, MP1, NP,
    PIT_MAX, PIT_MIN, PRM_SIZE, SHARPMAX, SHARPMIN, SID_FRAME_BYTES, SPEECH_FRAME_BYTES,
};
use super::correlation::corr_xy2;
use super::dtx::{DtxEncoder, SidFrame};
use super::filter::{residu, syn_filt, PreProcess};
use super::gain::GainQuantizer;
use super::lpc::{autocorr, lag_window, Levinson};
use super::lsp::{az_lsp, int_qlpc, lsp_lsf, weight_az};
use super::lsp_quant::LspQuantizer;
use super::pitch::{enc_lag3, g_pitch, parity_pitch, pitch_fr3_fast, pitch_ol_fast};
use super::rfc3389::ComfortNoise;
use super::tables::LSP_RESET;
use super::taming::ExcErrTracker;
use super::vad::{Vad, VadDecision, VadInput};
use crate::error::Result;
use crate::types::FrameType;
use crate::utils::validation::validate_frame;
use tracing::{debug, trace};

const PIT: usize = PIT_MAX as usize;
/// Start of the current frame in the speech buffer
const NEW_SPEECH: usize = L_TOTAL - L_FRAME;
/// Start of the frame being coded (the analysis looks 40 samples ahead)
const SPEECH: usize = NEW_SPEECH - L_NEXT;
/// Start of the analysis window
const P_WINDOW: usize = L_TOTAL - L_WINDOW;

/// Tilt of the perceptual weighting filter, Q15 (0.7)
const WEIGHT_TILT: Word16 = 22938;

/// One encoded frame as it goes on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedFrame {
    /// 80-bit speech frame
    Speech([u8; SPEECH_FRAME_BYTES]),
    /// 15-bit SID frame in two bytes
    Sid([u8; SID_FRAME_BYTES]),
    /// Comfort noise as a generic RFC 3389 payload
    CnRfc3389(Vec<u8>),
    /// Nothing is sent for this frame
    NoData,
}

impl EncodedFrame {
    /// Payload bytes, empty for [`EncodedFrame::NoData`]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Speech(b) => b,
            Self::Sid(b) => b,
            Self::CnRfc3389(b) => b,
            Self::NoData => &[],
        }
    }

    /// Frame type of the payload
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Speech(_) => FrameType::Speech,
            Self::Sid(_) | Self::CnRfc3389(_) => FrameType::Sid,
            Self::NoData => FrameType::Untransmitted,
        }
    }
}

/// Parameters produced for one frame before packing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameParams {
    /// The 15 parameters of a speech frame
    Speech(SpeechParams),
    /// SID parameters and the equivalent generic description
    Sid {
        /// Native SID fields
        params: SidParams,
        /// Same noise as an RFC 3389 payload
        noise: ComfortNoise,
    },
    /// Untransmitted frame
    NoData,
}

impl FrameParams {
    /// Frame type of these parameters
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Speech(_) => FrameType::Speech,
            Self::Sid { .. } => FrameType::Sid,
            Self::NoData => FrameType::Untransmitted,
        }
    }
}

impl From<SidFrame> for FrameParams {
    fn from(sid: SidFrame) -> Self {
        let u = |v: Word16| v as u16;
        Self::Sid {
            params: SidParams {
                l0: u(sid.lsf[0]),
                l1: u(sid.lsf[1]),
                l2: u(sid.lsf[2]),
                gain: u(sid.gain),
            },
            noise: ComfortNoise::from_sid(&sid.lpc, sid.energy_db),
        }
    }
}

/// G.729A/B encoder
#[derive(Debug, Clone)]
pub struct G729Encoder {
    config: G729Config,
    pre_process: PreProcess,
    old_speech: [Word16; L_TOTAL],
    old_wsp: [Word16; PIT + L_FRAME],
    old_exc: [Word16; EXC_HIST + L_FRAME],
    mem_w: [Word16; M],
    mem_w0: [Word16; M],
    lsp_old: [Word16; M],
    lsp_old_q: [Word16; M],
    sharp: Word16,
    levinson: Levinson,
    lsp_quantizer: LspQuantizer,
    gain_quantizer: GainQuantizer,
    taming: ExcErrTracker,
    vad: Vad,
    dtx: DtxEncoder,
    frame: Word16,
    past_vad: VadDecision,
    ppast_vad: VadDecision,
    seed: Word16,
}

impl G729Encoder {
    /// Create an encoder
    pub fn new(config: G729Config) -> Self {
        debug!(
            "Creating G.729 encoder: variant={}, cn_payload={}",
            config.variant(),
            config.cn_payload
        );
        Self {
            config,
            pre_process: PreProcess::new(),
            old_speech: [0; L_TOTAL],
            old_wsp: [0; PIT + L_FRAME],
            old_exc: [0; EXC_HIST + L_FRAME],
            mem_w: [0; M],
            mem_w0: [0; M],
            lsp_old: LSP_RESET,
            lsp_old_q: LSP_RESET,
            sharp: SHARPMIN,
            levinson: Levinson::new(),
            lsp_quantizer: LspQuantizer::new(),
            gain_quantizer: GainQuantizer::new(),
            taming: ExcErrTracker::new(),
            vad: Vad::new(),
            dtx: DtxEncoder::new(),
            frame: 0,
            past_vad: VadDecision::Voice,
            ppast_vad: VadDecision::Voice,
            seed: INIT_SEED,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &G729Config {
        &self.config
    }

    /// Replace the configuration and reset the state
    pub fn set_config(&mut self, config: G729Config) {
        debug!(
            "Updating G.729 encoder config from {} to {}",
            self.config.variant(),
            config.variant()
        );
        *self = Self::new(config);
    }

    /// Return to the initial state, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
        debug!("G.729 encoder reset");
    }

    /// Encode one frame of 80 samples
    ///
    /// # Errors
    ///
    /// Returns an error if `samples` is not exactly one frame
    pub fn encode_frame(&mut self, samples: &[i16]) -> Result<EncodedFrame> {
        validate_frame(samples, L_FRAME)?;
        let mut pcm = [0; L_FRAME];
        pcm.copy_from_slice(samples);

        let frame = match self.encode_params(&pcm) {
            FrameParams::Speech(params) => EncodedFrame::Speech(pack_speech(&params)),
            FrameParams::Sid { params, noise } => match self.config.cn_payload {
                CnPayloadFormat::Native => EncodedFrame::Sid(pack_sid(&params)),
                CnPayloadFormat::Rfc3389 => EncodedFrame::CnRfc3389(noise.to_bytes()),
            },
            FrameParams::NoData => EncodedFrame::NoData,
        };
        trace!(
            frame_type = %frame.frame_type(),
            bytes = frame.as_bytes().len(),
            "G.729 encoded frame"
        );
        Ok(frame)
    }

    /// Analyse one frame and return its parameters
    pub fn encode_params(&mut self, samples: &[i16; L_FRAME]) -> FrameParams {
        self.old_speech[NEW_SPEECH..].copy_from_slice(samples);
        self.pre_process.process(&mut self.old_speech[NEW_SPEECH..]);

        self.frame = if self.frame == MAX_16 { 256 } else { add(self.frame, 1) };

        let params = self.code_frame();

        self.old_speech.copy_within(L_FRAME.., 0);
        self.old_wsp.copy_within(L_FRAME.., 0);
        self.old_exc.copy_within(L_FRAME.., 0);
        params
    }

    fn code_frame(&mut self) -> FrameParams {
        let mut r_h = [0; NP + 1];
        let mut r_l = [0; NP + 1];
        let mut rc = [0; M];
        let mut a_t = [0; MP1];
        let mut lsp_new = [0; M];

        let exp_r0 = autocorr(&self.old_speech[P_WINDOW..], NP, &mut r_h, &mut r_l);
        let mut rh_nbe = [0; MP1];
        rh_nbe.copy_from_slice(&r_h[..MP1]);
        lag_window(NP, &mut r_h, &mut r_l);
        let _ = self.levinson.solve(&r_h, &r_l, &mut a_t, &mut rc);
        az_lsp(&a_t, &mut lsp_new, &self.lsp_old);

        let vad = if self.config.vad_enabled {
            let mut lsf_new = [0; M];
            lsp_lsf(&lsp_new, &mut lsf_new);
            let decision = self.vad.detect(&VadInput {
                rc: rc[1],
                lsf: &lsf_new,
                r_h: &r_h,
                r_l: &r_l,
                exp_r0,
                sigpp: &self.old_speech[P_WINDOW..],
                frm_count: self.frame,
                prev_marker: self.past_vad,
                pprev_marker: self.ppast_vad,
            });
            self.dtx.update(&rh_nbe, exp_r0, decision.is_voice());
            decision
        } else {
            VadDecision::Voice
        };

        if !vad.is_voice() && self.config.dtx_enabled {
            return self.code_inactive();
        }

        self.seed = INIT_SEED;
        self.ppast_vad = self.past_vad;
        self.past_vad = vad;

        let mut prm = [0; PRM_SIZE];
        let mut lsp_new_q = [0; M];
        let mut lsp_idx = [0; 2];
        self.lsp_quantizer.quantize(&lsp_new, &mut lsp_new_q, &mut lsp_idx);
        prm[..2].copy_from_slice(&lsp_idx);

        let mut aq_t = [0; 2 * MP1];
        let mut ap_t = [0; 2 * MP1];
        int_qlpc(&self.lsp_old_q, &lsp_new_q, &mut aq_t);
        weight_az(&aq_t[..MP1], GAMMA1, &mut ap_t[..MP1]);
        weight_az(&aq_t[MP1..], GAMMA1, &mut ap_t[MP1..]);

        self.lsp_old = lsp_new;
        self.lsp_old_q = lsp_new_q;

        self.code_subframes(&aq_t, &ap_t, &mut prm);
        FrameParams::Speech(SpeechParams::from_prm(&prm))
    }

    /// Weighted speech and open-loop lag, then the subframe searches
    fn code_subframes(
        &mut self,
        aq_t: &[Word16; 2 * MP1],
        ap_t: &[Word16; 2 * MP1],
        prm: &mut [Word16; PRM_SIZE],
    ) {
        let exc = EXC_HIST;
        let wsp = PIT;

        for sf in 0..2 {
            let i_subfr = sf * L_SUBFR;
            let aq = &aq_t[sf * MP1..(sf + 1) * MP1];
            let ap = &ap_t[sf * MP1..(sf + 1) * MP1];
            residu(
                aq,
                &self.old_speech[SPEECH + i_subfr - M..SPEECH + i_subfr + L_SUBFR],
                &mut self.old_exc[exc + i_subfr..exc + i_subfr + L_SUBFR],
            );

            let ap1 = tilted(ap);
            syn_filt(
                &ap1,
                &self.old_exc[exc + i_subfr..exc + i_subfr + L_SUBFR],
                &mut self.old_wsp[wsp + i_subfr..wsp + i_subfr + L_SUBFR],
                &mut self.mem_w,
                true,
            );
        }

        let t_op = pitch_ol_fast(&self.old_wsp);

        let mut t0_min = sub(t_op, 3).max(PIT_MIN);
        let mut t0_max = add(t0_min, 6);
        if t0_max > PIT_MAX {
            t0_max = PIT_MAX;
            t0_min = sub(t0_max, 6);
        }

        let mut p = 2;
        for sf in 0..2 {
            let i_subfr = sf * L_SUBFR;
            let first = sf == 0;
            let ap = &ap_t[sf * MP1..(sf + 1) * MP1];
            let pos = exc + i_subfr;

            // impulse response of the weighted synthesis filter
            let mut h1 = [0; L_SUBFR];
            let mut impulse = [0; L_SUBFR];
            impulse[0] = 4096;
            syn_filt(ap, &impulse, &mut h1, &mut [0; M], false);

            // target for the pitch search
            let mut xn = [0; L_SUBFR];
            syn_filt(ap, &self.old_exc[pos..pos + L_SUBFR], &mut xn, &mut self.mem_w0, false);

            let (t0, t0_frac) =
                pitch_fr3_fast(&mut self.old_exc, pos, &xn, &h1, t0_min, t0_max, first);
            let index = enc_lag3(t0, t0_frac, &mut t0_min, &mut t0_max, PIT_MIN, PIT_MAX, first);
            prm[p] = index;
            p += 1;
            if first {
                prm[p] = parity_pitch(index);
                p += 1;
            }

            let mut y1 = [0; L_SUBFR];
            syn_filt(ap, &self.old_exc[pos..pos + L_SUBFR], &mut y1, &mut [0; M], false);
            let (mut gain_pit, g_coeff) = g_pitch(&xn, &y1);

            let taming = self.taming.test_err(t0, t0_frac);
            if taming && gain_pit > GPCLIP {
                gain_pit = GPCLIP;
            }

            let mut xn2 = [0; L_SUBFR];
            for i in 0..L_SUBFR {
                let l_temp = l_shl(l_mult(y1[i], gain_pit), 1);
                xn2[i] = sub(xn[i], extract_h(l_temp));
            }

            let mut code = [0; L_SUBFR];
            let mut y2 = [0; L_SUBFR];
            let acelp = acelp_code_a(&xn2, &h1, t0, self.sharp, &mut code, &mut y2);
            prm[p] = acelp.positions;
            prm[p + 1] = acelp.signs;
            p += 2;

            let mut g_coeff_cs = [0; 5];
            let mut exp_g_coeff_cs = [0; 5];
            g_coeff_cs[0] = g_coeff[0];
            exp_g_coeff_cs[0] = negate(g_coeff[1]);
            g_coeff_cs[1] = negate(g_coeff[2]);
            exp_g_coeff_cs[1] = negate(add(g_coeff[3], 1));
            corr_xy2(&xn, &y1, &y2, &mut g_coeff_cs, &mut exp_g_coeff_cs);

            let (index, gain_pit, gain_code) =
                self.gain_quantizer
                    .quantize(&code, &g_coeff_cs, &exp_g_coeff_cs, taming);
            prm[p] = index;
            p += 1;

            self.sharp = gain_pit.clamp(SHARPMIN, SHARPMAX);

            for i in 0..L_SUBFR {
                let mut l_temp = l_mult(self.old_exc[pos + i], gain_pit);
                l_temp = l_mac(l_temp, code[i], gain_code);
                self.old_exc[pos + i] = round(l_shl(l_temp, 1));
            }

            self.taming.update(gain_pit, t0);

            for (j, i) in (L_SUBFR - M..L_SUBFR).enumerate() {
                let temp = extract_h(l_shl(l_mult(y1[i], gain_pit), 1));
                let k = extract_h(l_shl(l_mult(y2[i], gain_code), 2));
                self.mem_w0[j] = sub(xn[i], add(temp, k));
            }
        }
    }

    /// Inactive frame: comfort noise, SID decision and filter memories
    fn code_inactive(&mut self) -> FrameParams {
        let mut aq_t = [0; 2 * MP1];
        let sid = self.dtx.encode(
            self.past_vad.is_voice(),
            &mut self.levinson,
            &mut self.old_exc,
            EXC_HIST,
            &mut self.lsp_old_q,
            &mut aq_t,
            self.lsp_quantizer.freq_prev_mut(),
            &mut self.seed,
            &mut self.taming,
        );
        self.ppast_vad = self.past_vad;
        self.past_vad = VadDecision::Noise;

        // keep the weighting filter memories in step with the noise
        for sf in 0..2 {
            let i_subfr = sf * L_SUBFR;
            let aq = &aq_t[sf * MP1..(sf + 1) * MP1];

            let mut xn = [0; L_SUBFR];
            residu(
                aq,
                &self.old_speech[SPEECH + i_subfr - M..SPEECH + i_subfr + L_SUBFR],
                &mut xn,
            );

            let mut ap_t = [0; MP1];
            weight_az(aq, GAMMA1, &mut ap_t);
            let ap = tilted(&ap_t);
            syn_filt(
                &ap,
                &xn,
                &mut self.old_wsp[PIT + i_subfr..PIT + i_subfr + L_SUBFR],
                &mut self.mem_w,
                true,
            );

            for i in 0..L_SUBFR {
                xn[i] = sub(xn[i], self.old_exc[EXC_HIST + i_subfr + i]);
            }
            let input = xn;
            syn_filt(&ap_t, &input, &mut xn, &mut self.mem_w0, true);
        }

        self.sharp = SHARPMIN;

        match sid {
            Some(sid) => FrameParams::from(sid),
            None => FrameParams::NoData,
        }
    }
}

/// `A(z/GAMMA1)` followed by the tilt `1 - 0.7 z^-1`
fn tilted(ap: &[Word16]) -> [Word16; MP1] {
    let mut ap1 = [0; MP1];
    ap1[0] = 4096;
    for i in 1..=M {
        ap1[i] = sub(ap[i], mult(ap[i - 1], WEIGHT_TILT));
    }
    ap1
}
