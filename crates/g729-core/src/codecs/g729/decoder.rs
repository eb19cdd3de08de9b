//! G.729A decoder with comfort noise generation and erasure concealment

use super::acelp::decod_acelp;
use super::basic_op::*;
use super::bitstream::{unpack_sid, unpack_speech};
use super::cng::{random, CngDecoder, SidEnergy};
use super::config::{CnPayloadFormat, G729Config};
use super::constants::{
    EXC_HIST, INIT_SEED, L_FRAME, L_SUBFR, M, MP1, PIT_MAX, PIT_MIN, SEED_FER, SHARPMAX,
    SHARPMIN, SID_FRAME_BYTES, SPEECH_FRAME_BYTES,
};
use super::filter::{syn_filt, PostProcess};
use super::gain::GainDecoder;
use super::lsp::{az_lsp, int_qlpc};
use super::lsp_quant::LspDecoder;
use super::pitch::{check_parity_pitch, dec_lag3, pred_lt_3};
use super::postfilter::PostFilter;
use super::rfc3389::ComfortNoise;
use super::tables::LSP_RESET;
use crate::error::{CodecError, Result};
use crate::types::FrameType;
use tracing::{debug, trace, warn};

/// How to interpret the payload handed to [`G729Decoder::decode_frame`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeFlags {
    /// The frame was lost; the payload is ignored
    pub erasure: bool,
    /// The payload is a SID frame
    pub sid: bool,
    /// Comfort noise arrives as an RFC 3389 payload
    pub rfc3389: bool,
}

impl DecodeFlags {
    /// Flags of an erased frame
    pub fn erased() -> Self {
        Self {
            erasure: true,
            ..Self::default()
        }
    }

    /// Flags of a native SID frame
    pub fn sid() -> Self {
        Self {
            sid: true,
            ..Self::default()
        }
    }

    /// Flags of an RFC 3389 comfort noise payload
    pub fn comfort_noise() -> Self {
        Self {
            sid: true,
            rfc3389: true,
            ..Self::default()
        }
    }
}

/// Decoded content of one frame slot
enum Frame {
    Speech([Word16; 11]),
    Sid { lsf: [Word16; 3], gain: Word16 },
    ComfortNoise(ComfortNoise),
    Untransmitted,
    Erased,
}

/// G.729A/B decoder
#[derive(Debug, Clone)]
pub struct G729Decoder {
    config: G729Config,
    old_exc: [Word16; EXC_HIST + L_FRAME],
    mem_syn: [Word16; M],
    /// Last `M` unfiltered samples of the previous frame, then this frame
    synth: [Word16; M + L_FRAME],
    lsp_old: [Word16; M],
    lsp_decoder: LspDecoder,
    gain_decoder: GainDecoder,
    cng: CngDecoder,
    post_filter: PostFilter,
    post_process: PostProcess,
    sharp: Word16,
    old_t0: Word16,
    gain_pitch: Word16,
    gain_code: Word16,
    seed: Word16,
    seed_fer: Word16,
    past_ftyp: FrameType,
    sid_sav: SidEnergy,
}

impl G729Decoder {
    /// Create a decoder
    pub fn new(config: G729Config) -> Self {
        debug!(
            "Creating G.729 decoder: postfilter={}, cn_payload={}",
            config.postfilter, config.cn_payload
        );
        Self {
            config,
            old_exc: [0; EXC_HIST + L_FRAME],
            mem_syn: [0; M],
            synth: [0; M + L_FRAME],
            lsp_old: LSP_RESET,
            lsp_decoder: LspDecoder::new(),
            gain_decoder: GainDecoder::new(),
            cng: CngDecoder::new(),
            post_filter: PostFilter::new(),
            post_process: PostProcess::new(),
            sharp: SHARPMIN,
            old_t0: 60,
            gain_pitch: 0,
            gain_code: 0,
            seed: INIT_SEED,
            seed_fer: SEED_FER,
            past_ftyp: FrameType::Speech,
            sid_sav: SidEnergy { ener: 0, sh: 1 },
        }
    }

    /// Current configuration
    pub fn config(&self) -> &G729Config {
        &self.config
    }

    /// Replace the configuration and reset the state
    pub fn set_config(&mut self, config: G729Config) {
        debug!(
            "Updating G.729 decoder config: postfilter={}, cn_payload={}",
            config.postfilter, config.cn_payload
        );
        *self = Self::new(config);
    }

    /// Return to the initial state, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
        debug!("G.729 decoder reset");
    }

    /// Adaptive (Q14) and fixed (Q1) codebook gains of the last subframe
    pub fn last_gains(&self) -> (i16, i16) {
        (self.gain_pitch, self.gain_code)
    }

    /// Pitch lag used when the next lag has to be concealed
    pub fn last_pitch_lag(&self) -> i16 {
        self.old_t0
    }

    /// Target comfort noise gain
    pub fn sid_gain(&self) -> i16 {
        self.cng.sid_gain()
    }

    /// Decode one frame slot
    ///
    /// `data` is the payload, `None` or empty for a frame that was not
    /// transmitted. With `flags.erasure` set the payload is ignored and the
    /// frame is concealed.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the flags
    pub fn decode_frame(&mut self, data: Option<&[u8]>, flags: DecodeFlags) -> Result<[i16; L_FRAME]> {
        let data = data.unwrap_or_default();
        let frame = if flags.erasure {
            Frame::Erased
        } else if data.is_empty() {
            Frame::Untransmitted
        } else if flags.rfc3389 {
            Frame::ComfortNoise(ComfortNoise::parse(data)?)
        } else if flags.sid {
            let sid = unpack_sid(data)?;
            let w = |v: u16| v as Word16;
            Frame::Sid {
                lsf: [w(sid.l0), w(sid.l1), w(sid.l2)],
                gain: w(sid.gain),
            }
        } else {
            Frame::Speech(unpack_speech(data)?.to_prm())
        };
        Ok(self.decode(frame))
    }

    /// Decode a payload, deriving its type from the length
    ///
    /// 10 bytes are speech and an empty payload is an untransmitted frame.
    /// Anything else is comfort noise: a 2-byte SID, or an RFC 3389 payload
    /// when the configuration selects that format.
    ///
    /// # Errors
    ///
    /// Returns an error if the length fits none of these
    pub fn decode_payload(&mut self, data: &[u8]) -> Result<[i16; L_FRAME]> {
        let flags = match (data.len(), self.config.cn_payload) {
            (0, _) | (SPEECH_FRAME_BYTES, _) => DecodeFlags::default(),
            (_, CnPayloadFormat::Rfc3389) => DecodeFlags::comfort_noise(),
            (SID_FRAME_BYTES, CnPayloadFormat::Native) => DecodeFlags::sid(),
            (len, CnPayloadFormat::Native) => {
                return Err(CodecError::invalid_payload(format!(
                    "{len}-byte payload is neither a speech nor a SID frame"
                )))
            }
        };
        self.decode_frame(Some(data), flags)
    }

    /// Conceal a lost frame
    pub fn conceal(&mut self) -> [i16; L_FRAME] {
        self.decode(Frame::Erased)
    }

    fn decode(&mut self, frame: Frame) -> [i16; L_FRAME] {
        let bfi = matches!(frame, Frame::Erased);
        let mut parity_error = false;
        let ftyp = match frame {
            Frame::Speech(_) => FrameType::Speech,
            Frame::Sid { .. } | Frame::ComfortNoise(_) => FrameType::Sid,
            Frame::Untransmitted => FrameType::Untransmitted,
            Frame::Erased if self.past_ftyp == FrameType::Speech => {
                parity_error = true;
                FrameType::Speech
            }
            Frame::Erased => FrameType::Untransmitted,
        };

        let mut a_t = [0; 2 * MP1];
        let mut t2 = [0; 2];
        if ftyp == FrameType::Speech {
            let prm = match frame {
                Frame::Speech(prm) => prm,
                _ => [0; 11],
            };
            self.decode_speech(&prm, bfi, parity_error, &mut a_t, &mut t2);
        } else {
            self.decode_noise(frame, &mut a_t, &mut t2);
        }

        if !bfi {
            self.sid_sav = SidEnergy::measure(&self.old_exc[EXC_HIST..]);
        }
        self.old_exc.copy_within(L_FRAME.., 0);
        self.past_ftyp = ftyp;

        let mut out = [0; L_FRAME];
        if self.config.postfilter {
            self.post_filter
                .process(&self.synth, &a_t, &t2, ftyp == FrameType::Speech, &mut out);
        } else {
            out.copy_from_slice(&self.synth[M..]);
        }
        self.synth.copy_within(L_FRAME.., 0);
        self.post_process.process(&mut out);

        trace!(
            frame_type = %ftyp,
            erased = bfi,
            gain_pitch = self.gain_pitch,
            gain_code = self.gain_code,
            "G.729 decoded frame"
        );
        out
    }

    fn decode_noise(&mut self, frame: Frame, a_t: &mut [Word16; 2 * MP1], t2: &mut [Word16; 2]) {
        match frame {
            Frame::Sid { lsf, gain } => {
                self.cng
                    .receive_sid(&lsf, gain, self.lsp_decoder.freq_prev_mut());
            }
            Frame::ComfortNoise(noise) => {
                let mut lsp = [0; M];
                az_lsp(&noise.lpc(), &mut lsp, &self.lsp_old);
                self.cng.set_parameters(&lsp, noise.gain_index());
            }
            _ if self.past_ftyp == FrameType::Speech => {
                self.cng.recover_sid_gain(self.sid_sav);
            }
            _ => {}
        }

        self.cng.generate(
            self.past_ftyp == FrameType::Speech,
            &mut self.old_exc,
            EXC_HIST,
            &mut self.lsp_old,
            a_t,
            &mut self.seed,
        );

        for sf in 0..2 {
            self.synthesize(sf, &a_t[sf * MP1..(sf + 1) * MP1]);
            t2[sf] = self.old_t0;
        }
        self.sharp = SHARPMIN;
    }

    fn decode_speech(
        &mut self,
        prm: &[Word16; 11],
        bfi: bool,
        parity_error: bool,
        a_t: &mut [Word16; 2 * MP1],
        t2: &mut [Word16; 2],
    ) {
        self.seed = INIT_SEED;

        let mut lsp_new = [0; M];
        self.lsp_decoder.decode([prm[0], prm[1]], &mut lsp_new, bfi);
        int_qlpc(&self.lsp_old, &lsp_new, a_t);
        self.lsp_old = lsp_new;

        let parity_error = parity_error || (!bfi && check_parity_pitch(prm[2], prm[3]));
        if parity_error && !bfi {
            warn!(lag_index = prm[2], "pitch parity error, concealing first subframe lag");
        }

        // per subframe: lag index, positions, signs, gain index
        let subframes = [
            (prm[2], prm[4], prm[5], prm[6]),
            (prm[7], prm[8], prm[9], prm[10]),
        ];

        let mut t0 = 0;
        let mut t0_frac = 0;
        for (sf, &(lag, mut positions, mut signs, gain)) in subframes.iter().enumerate() {
            let first = sf == 0;
            let bad_pitch = if first { bfi || parity_error } else { bfi };
            if bad_pitch {
                t0 = self.old_t0;
                t0_frac = 0;
                self.old_t0 = add(self.old_t0, 1).min(PIT_MAX);
            } else {
                dec_lag3(lag, PIT_MIN, PIT_MAX, first, &mut t0, &mut t0_frac);
                self.old_t0 = t0;
            }
            t2[sf] = t0;

            let pos = EXC_HIST + sf * L_SUBFR;
            pred_lt_3(&mut self.old_exc, pos, t0, t0_frac, L_SUBFR);

            if bfi {
                positions = random(&mut self.seed_fer) & 0x1fff;
                signs = random(&mut self.seed_fer) & 0x000f;
            }
            let mut code = [0; L_SUBFR];
            decod_acelp(signs, positions, &mut code);

            let j = shl(self.sharp, 1);
            if (t0 as usize) < L_SUBFR {
                for i in t0 as usize..L_SUBFR {
                    code[i] = add(code[i], mult(code[i - t0 as usize], j));
                }
            }

            self.gain_decoder
                .decode(gain, &code, bfi, &mut self.gain_pitch, &mut self.gain_code);
            self.sharp = self.gain_pitch.clamp(SHARPMIN, SHARPMAX);

            for i in 0..L_SUBFR {
                let l_temp = l_mult(self.old_exc[pos + i], self.gain_pitch);
                let l_temp = l_mac(l_temp, code[i], self.gain_code);
                self.old_exc[pos + i] = round(l_shl(l_temp, 1));
            }

            self.synthesize(sf, &a_t[sf * MP1..(sf + 1) * MP1]);
        }
    }

    /// Synthesis of one subframe; a saturated pass scales the whole
    /// excitation history down by 4 and filters again
    fn synthesize(&mut self, sf: usize, a: &[Word16]) {
        let pos = EXC_HIST + sf * L_SUBFR;
        let out = M + sf * L_SUBFR;
        let overflow = syn_filt(
            a,
            &self.old_exc[pos..pos + L_SUBFR],
            &mut self.synth[out..out + L_SUBFR],
            &mut self.mem_syn,
            false,
        );
        if overflow {
            warn!(subframe = sf, "synthesis overflow, rescaling excitation");
            for v in self.old_exc.iter_mut() {
                *v = shr(*v, 2);
            }
            syn_filt(
                a,
                &self.old_exc[pos..pos + L_SUBFR],
                &mut self.synth[out..out + L_SUBFR],
                &mut self.mem_syn,
                true,
            );
        } else {
            self.mem_syn
                .copy_from_slice(&self.synth[out + L_SUBFR - M..out + L_SUBFR]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::g729::bitstream::{pack_sid, SidParams};

    fn decoder() -> G729Decoder {
        G729Decoder::new(G729Config::default())
    }

    #[test]
    fn test_initial_state() {
        let dec = decoder();
        assert_eq!(dec.last_gains(), (0, 0));
        assert_eq!(dec.last_pitch_lag(), 60);
    }

    #[test]
    fn test_payload_lengths() {
        let mut dec = decoder();
        assert!(dec.decode_payload(&[0; 10]).is_ok());
        assert!(dec.decode_payload(&[0; 2]).is_ok());
        assert!(dec.decode_payload(&[]).is_ok());
        assert!(dec.decode_payload(&[0; 7]).is_err());

        let mut dec = G729Decoder::new(G729Config::default().with_cn_payload(CnPayloadFormat::Rfc3389));
        assert!(dec.decode_payload(&[40, 127, 127]).is_ok());
        assert!(dec.decode_payload(&[200]).is_err());
    }

    #[test]
    fn test_flags_must_match_payload() {
        let mut dec = decoder();
        assert!(dec.decode_frame(Some(&[0; 2]), DecodeFlags::default()).is_err());
        assert!(dec.decode_frame(Some(&[0; 10]), DecodeFlags::sid()).is_err());
        // erased frames ignore the payload
        assert!(dec.decode_frame(Some(&[0; 3]), DecodeFlags::erased()).is_ok());
        assert!(dec.decode_frame(None, DecodeFlags::default()).is_ok());
    }

    #[test]
    fn test_erasure_repeats_and_advances_lag() {
        let mut dec = decoder();
        dec.decode_payload(&[0; 10]).unwrap();
        let lag = dec.last_pitch_lag();
        dec.conceal();
        assert_eq!(dec.last_pitch_lag(), (lag + 2).min(PIT_MAX));
    }

    #[test]
    fn test_sid_sets_noise_gain() {
        let mut dec = decoder();
        let quiet = pack_sid(&SidParams { gain: 2, ..SidParams::default() });
        let loud = pack_sid(&SidParams { gain: 20, ..SidParams::default() });
        dec.decode_frame(Some(&quiet), DecodeFlags::sid()).unwrap();
        let low = dec.sid_gain();
        dec.decode_frame(Some(&loud), DecodeFlags::sid()).unwrap();
        assert!(dec.sid_gain() > low);
    }

    #[test]
    fn test_first_lost_sid_recovers_gain_from_speech() {
        let mut dec = decoder();
        let before = dec.sid_gain();
        // largest gain indices in both subframes
        for _ in 0..4 {
            dec.decode_payload(&[0xff; 10]).unwrap();
        }
        dec.decode_payload(&[]).unwrap();
        assert_ne!(dec.sid_gain(), before);
    }

    #[test]
    fn test_noise_without_postfilter() {
        let mut dec = G729Decoder::new(G729Config::default().with_postfilter(false));
        let sid = pack_sid(&SidParams { gain: 25, ..SidParams::default() });
        dec.decode_frame(Some(&sid), DecodeFlags::sid()).unwrap();
        let mut energy = 0i64;
        for _ in 0..10 {
            let out = dec.decode_payload(&[]).unwrap();
            energy += out.iter().map(|&v| i64::from(v) * i64::from(v)).sum::<i64>();
        }
        assert!(energy > 0);
    }
}
