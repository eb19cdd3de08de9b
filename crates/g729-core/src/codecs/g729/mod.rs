//! G.729 Annex A/B Speech Codec
//!
//! Bit-exact fixed-point implementation of the reduced-complexity G.729
//! (Annex A) with the silence compression scheme of Annex B.
//!
//! ## Runtime Configuration
//!
//! Silence suppression and the decoder postfilter can be switched at
//! runtime:
//!
//! ```rust
//! use g729_core::codecs::g729::{G729Codec, G729Config};
//!
//! // Default configuration (G.729AB - VAD, DTX and comfort noise)
//! let mut codec = G729Codec::new_default();
//! assert_eq!(codec.variant(), "G.729AB");
//!
//! // Continuous transmission
//! codec.set_config(G729Config::new().with_dtx(false));
//! assert_eq!(codec.variant(), "G.729A");
//! ```
//!
//! ## Frame Types
//!
//! | Frame | Bytes | Content |
//! |-------|-------|---------|
//! | Speech | 10 | LSP, pitch lags, ACELP pulses and gains of two subframes |
//! | SID | 2 | Noise spectrum and level (15 bits) |
//! | RFC 3389 CN | 1-11 | Level in -dBov and reflection coefficients |
//! | Untransmitted | 0 | Decoder keeps generating comfort noise |
//!
//! ## Packetization
//!
//! [`G729Codec::encode_packets`] turns any number of frames into RTP
//! payloads: runs of speech frames, each run closed by a SID, comfort noise
//! packets and gaps where nothing is sent. [`G729Codec::decode_packets`]
//! plays them back, concealing the frames between packets.
//!
//! [`AudioCodec::encode`] produces exactly one payload per call, which an
//! empty payload counts as when the frame was not transmitted. A buffer
//! whose frames would need more than one packet is refused with
//! [`CodecError::DtxBoundary`] and leaves the encoder untouched.

use crate::error::{CodecError, Result};
use crate::types::{AudioCodec, AudioCodecExt, CodecInfo};
use crate::utils::validation::{validate_buffer_size, validate_frame_multiple};
use tracing::{debug, trace};

mod acelp;
mod basic_op;
pub mod bitstream;
mod cng;
mod config;
mod constants;
mod correlation;
mod decoder;
mod dspfunc;
mod dtx;
mod encoder;
mod filter;
mod gain;
mod lpc;
mod lsp;
mod lsp_quant;
mod oper_32b;
mod packet;
mod pitch;
mod postfilter;
pub mod rfc3389;
mod sid_lsf;
mod tables;
mod tables_dtx;
mod taming;
mod vad;

#[cfg(test)]
mod tests;

pub use config::{CnPayloadFormat, G729Config};
pub use constants::{L_FRAME, SID_FRAME_BYTES, SPEECH_FRAME_BYTES};
pub use decoder::{DecodeFlags, G729Decoder};
pub use encoder::{EncodedFrame, FrameParams, G729Encoder};
pub use packet::{G729Packet, CN_PAYLOAD_TYPE, PAYLOAD_TYPE};

/// Sample rate of G.729, Hz
pub const SAMPLE_RATE: u32 = 8000;
/// Bit rate of the speech frames, bit/s
pub const BITRATE: u32 = 8000;

/// G.729 codec implementation
///
/// Couples one encoder and one decoder channel behind the host codec
/// traits.
#[derive(Debug, Clone)]
pub struct G729Codec {
    config: G729Config,
    encoder: G729Encoder,
    decoder: G729Decoder,
    /// Frames encoded since the last reset
    encoded_frames: u64,
    /// Frames decoded since the last reset
    decoded_frames: u64,
}

impl G729Codec {
    /// Create a new G.729 codec with default configuration (G.729AB)
    pub fn new_default() -> Self {
        Self::new(G729Config::default())
    }

    /// Create a new G.729 codec with a specific configuration
    pub fn new(config: G729Config) -> Self {
        debug!(
            "Creating G.729 codec: variant={}, BW efficiency={:.1}%",
            config.variant(),
            config.bandwidth_efficiency() * 100.0
        );
        Self {
            encoder: G729Encoder::new(config.clone()),
            decoder: G729Decoder::new(config.clone()),
            config,
            encoded_frames: 0,
            decoded_frames: 0,
        }
    }

    /// Create a codec for a host stream format
    ///
    /// # Errors
    ///
    /// G.729 only runs at 8 kHz mono; anything else is rejected.
    pub fn with_format(sample_rate: u32, channels: u8, config: G729Config) -> Result<Self> {
        if sample_rate != SAMPLE_RATE {
            return Err(CodecError::InvalidSampleRate {
                rate: sample_rate,
                supported: vec![SAMPLE_RATE],
            });
        }
        if channels != 1 {
            return Err(CodecError::InvalidChannelCount {
                channels,
                supported: vec![1],
            });
        }
        Ok(Self::new(config))
    }

    /// Current configuration
    pub fn config(&self) -> &G729Config {
        &self.config
    }

    /// Replace the configuration; both channels restart
    pub fn set_config(&mut self, config: G729Config) {
        debug!(
            "Changing G.729 configuration from {} to {}",
            self.config.variant(),
            config.variant()
        );
        self.encoder.set_config(config.clone());
        self.decoder.set_config(config.clone());
        self.config = config;
        self.encoded_frames = 0;
        self.decoded_frames = 0;
    }

    /// Get the G.729 variant name
    pub fn variant(&self) -> &'static str {
        self.config.variant()
    }

    /// Encoder channel
    pub fn encoder_mut(&mut self) -> &mut G729Encoder {
        &mut self.encoder
    }

    /// Decoder channel
    pub fn decoder_mut(&mut self) -> &mut G729Decoder {
        &mut self.decoder
    }

    /// Encode any number of frames into RTP payloads
    ///
    /// Speech frames accumulate in one packet until a SID frame closes it
    /// or a frame is not transmitted. RFC 3389 comfort noise always gets a
    /// packet of its own.
    ///
    /// # Errors
    ///
    /// Returns an error if `samples` is not a whole number of frames
    pub fn encode_packets(&mut self, samples: &[i16]) -> Result<Vec<G729Packet>> {
        validate_frame_multiple(samples, L_FRAME)?;

        let mut packets = Vec::new();
        let mut open: Option<G729Packet> = None;
        for pcm in samples.chunks_exact(L_FRAME) {
            let frame = self.encoded_frames;
            self.encoded_frames += 1;

            match self.encoder.encode_frame(pcm)? {
                EncodedFrame::Speech(bytes) => open
                    .get_or_insert_with(|| G729Packet::speech(frame))
                    .payload
                    .extend_from_slice(&bytes),
                EncodedFrame::Sid(bytes) => {
                    let mut packet = open.take().unwrap_or_else(|| G729Packet::speech(frame));
                    packet.payload.extend_from_slice(&bytes);
                    packets.push(packet);
                }
                EncodedFrame::CnRfc3389(bytes) => {
                    packets.extend(open.take());
                    packets.push(G729Packet::comfort_noise(frame, bytes));
                }
                EncodedFrame::NoData => packets.extend(open.take()),
            }
        }
        packets.extend(open);

        trace!(
            "G.729 encoded {} samples to {} packets",
            samples.len(),
            packets.len()
        );
        Ok(packets)
    }

    /// Decode packets in frame order
    ///
    /// Frames missing between the last decoded frame and a packet are
    /// concealed. After speech that is a frame erasure; during a DTX pause
    /// the comfort noise carries on.
    ///
    /// # Errors
    ///
    /// Returns an error for a packet older than the frames already decoded
    /// or a payload that cannot be split into frames
    pub fn decode_packets(&mut self, packets: &[G729Packet]) -> Result<Vec<i16>> {
        let frames: usize = packets.iter().map(G729Packet::frames).sum();
        let mut decoded = Vec::with_capacity(frames * L_FRAME);

        for packet in packets {
            if packet.frame < self.decoded_frames {
                return Err(CodecError::invalid_payload(format!(
                    "Packet for frame {} arrived after frame {}",
                    packet.frame, self.decoded_frames
                )));
            }
            let gap = packet.frame - self.decoded_frames;
            if gap > 0 {
                trace!("Concealing {} G.729 frames before frame {}", gap, packet.frame);
            }
            for _ in 0..gap {
                decoded.extend_from_slice(&self.decoder.conceal());
                self.decoded_frames += 1;
            }

            if packet.is_comfort_noise() {
                let pcm = self
                    .decoder
                    .decode_frame(Some(&packet.payload), DecodeFlags::comfort_noise())?;
                decoded.extend_from_slice(&pcm);
                self.decoded_frames += 1;
            } else {
                self.decode_g729(&packet.payload, &mut decoded)?;
            }
        }
        Ok(decoded)
    }

    /// Decode speech frames and an optional trailing SID, appending to `out`
    fn decode_g729(&mut self, data: &[u8], out: &mut Vec<i16>) -> Result<()> {
        let tail = data.len() % SPEECH_FRAME_BYTES;
        if tail != 0 && tail != SID_FRAME_BYTES {
            return Err(CodecError::invalid_payload(format!(
                "Invalid G.729 payload size: {} bytes",
                data.len()
            )));
        }

        let (speech, sid) = data.split_at(data.len() - tail);
        for frame in speech.chunks_exact(SPEECH_FRAME_BYTES) {
            let pcm = self.decoder.decode_frame(Some(frame), DecodeFlags::default())?;
            out.extend_from_slice(&pcm);
            self.decoded_frames += 1;
        }
        if !sid.is_empty() {
            let pcm = self.decoder.decode_frame(Some(sid), DecodeFlags::sid())?;
            out.extend_from_slice(&pcm);
            self.decoded_frames += 1;
        }
        Ok(())
    }

    /// Encode a buffer into a single payload
    fn encode_single(&mut self, samples: &[i16]) -> Result<Vec<u8>> {
        validate_frame_multiple(samples, L_FRAME)?;
        let frames = samples.len() / L_FRAME;
        let start = self.encoded_frames;
        let saved = (frames > 1).then(|| self.encoder.clone());

        let mut packets = self.encode_packets(samples)?;
        let fits = match packets.as_slice() {
            [] => frames == 1,
            [packet] => packet.frame == start && packet.frames() == frames,
            _ => false,
        };
        if fits {
            return Ok(packets.pop().map(|p| p.payload).unwrap_or_default());
        }

        let boundary = match packets.first() {
            Some(packet) if packet.frame == start => packet.frames(),
            _ => 1,
        };
        if let Some(encoder) = saved {
            self.encoder = encoder;
            self.encoded_frames = start;
        }
        Err(CodecError::DtxBoundary { frame: boundary })
    }

    /// Decode one payload as produced by [`AudioCodec::encode`]
    fn decode_single(&mut self, data: &[u8], out: &mut Vec<i16>) -> Result<()> {
        if data.is_empty() {
            let pcm = self.decoder.decode_frame(None, DecodeFlags::default())?;
            out.extend_from_slice(&pcm);
            self.decoded_frames += 1;
            return Ok(());
        }

        let tail = data.len() % SPEECH_FRAME_BYTES;
        if tail != 0 && self.config.cn_payload == CnPayloadFormat::Rfc3389 {
            let pcm = self
                .decoder
                .decode_frame(Some(data), DecodeFlags::comfort_noise())?;
            out.extend_from_slice(&pcm);
            self.decoded_frames += 1;
            return Ok(());
        }
        self.decode_g729(data, out)
    }
}

impl Default for G729Codec {
    fn default() -> Self {
        Self::new_default()
    }
}

impl AudioCodec for G729Codec {
    fn encode(&mut self, samples: &[i16]) -> Result<Vec<u8>> {
        let encoded = self.encode_single(samples)?;

        trace!(
            "G.729 encoded {} samples to {} bytes",
            samples.len(),
            encoded.len()
        );
        Ok(encoded)
    }

    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>> {
        let mut decoded = Vec::with_capacity(self.max_decoded_size(data.len()));
        self.decode_single(data, &mut decoded)?;

        trace!(
            "G.729 decoded {} bytes to {} samples",
            data.len(),
            decoded.len()
        );
        Ok(decoded)
    }

    fn info(&self) -> CodecInfo {
        CodecInfo {
            name: "G729",
            sample_rate: SAMPLE_RATE,
            channels: 1,
            bitrate: BITRATE,
            frame_size: L_FRAME,
            payload_type: Some(PAYLOAD_TYPE),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.encoder.reset();
        self.decoder.reset();
        self.encoded_frames = 0;
        self.decoded_frames = 0;

        debug!("G.729 codec reset");
        Ok(())
    }

    fn frame_size(&self) -> usize {
        L_FRAME
    }
}

impl AudioCodecExt for G729Codec {
    fn encode_to_buffer(&mut self, samples: &[i16], output: &mut [u8]) -> Result<usize> {
        validate_frame_multiple(samples, L_FRAME)?;
        validate_buffer_size(self.max_encoded_size(samples.len()), output.len())?;

        let encoded = self.encode_single(samples)?;
        output[..encoded.len()].copy_from_slice(&encoded);

        trace!(
            "G.729 encoded {} samples to {} bytes (buffer)",
            samples.len(),
            encoded.len()
        );
        Ok(encoded.len())
    }

    fn decode_to_buffer(&mut self, data: &[u8], output: &mut [i16]) -> Result<usize> {
        validate_buffer_size(self.max_decoded_size(data.len()), output.len())?;

        let mut decoded = Vec::with_capacity(output.len());
        self.decode_single(data, &mut decoded)?;
        output[..decoded.len()].copy_from_slice(&decoded);

        trace!(
            "G.729 decoded {} bytes to {} samples (buffer)",
            data.len(),
            decoded.len()
        );
        Ok(decoded.len())
    }

    fn max_encoded_size(&self, input_samples: usize) -> usize {
        let frames = input_samples.div_ceil(L_FRAME).max(1);
        match self.config.cn_payload {
            // one CN payload may be a byte longer than a speech frame
            CnPayloadFormat::Rfc3389 => frames * SPEECH_FRAME_BYTES + 1,
            CnPayloadFormat::Native => frames * SPEECH_FRAME_BYTES,
        }
    }

    fn max_decoded_size(&self, input_bytes: usize) -> usize {
        input_bytes.div_ceil(SPEECH_FRAME_BYTES).max(1) * L_FRAME
    }
}
