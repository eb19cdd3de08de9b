//! Core types and traits for the codec library
//!
//! These are the host-facing traits every RVOIP codec implements, plus the
//! small descriptive types that go with them.

use crate::error::Result;
use std::fmt;

/// Primary trait for audio codecs
///
/// This trait defines the core operations that all audio codecs must implement:
/// encoding, decoding, and configuration management.
pub trait AudioCodec: Send + Sync {
    /// Encode audio samples to compressed data
    ///
    /// # Arguments
    ///
    /// * `samples` - Input audio samples as 16-bit PCM
    ///
    /// # Errors
    ///
    /// Returns an error if the input length is not a whole number of frames
    fn encode(&mut self, samples: &[i16]) -> Result<Vec<u8>>;

    /// Decode compressed data to audio samples
    ///
    /// # Arguments
    ///
    /// * `data` - Compressed audio data
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be split into frames
    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>>;

    /// Get codec information
    fn info(&self) -> CodecInfo;

    /// Reset codec state
    ///
    /// This clears all internal state and prepares the codec for fresh input.
    /// Useful for handling stream discontinuities.
    fn reset(&mut self) -> Result<()>;

    /// Get the expected frame size in samples
    fn frame_size(&self) -> usize;

    /// Check if the codec supports variable frame sizes
    fn supports_variable_frame_size(&self) -> bool {
        false
    }
}

/// Extended trait for codecs with advanced features
pub trait AudioCodecExt: AudioCodec {
    /// Encode with pre-allocated output buffer
    ///
    /// Returns the number of bytes written to `output`.
    fn encode_to_buffer(&mut self, samples: &[i16], output: &mut [u8]) -> Result<usize>;

    /// Decode with pre-allocated output buffer
    ///
    /// Returns the number of samples written to `output`.
    fn decode_to_buffer(&mut self, data: &[u8], output: &mut [i16]) -> Result<usize>;

    /// Get maximum encoded size for a given input size
    fn max_encoded_size(&self, input_samples: usize) -> usize;

    /// Get maximum decoded size for a given input size
    fn max_decoded_size(&self, input_bytes: usize) -> usize;
}

/// Audio codec information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecInfo {
    /// Codec name
    pub name: &'static str,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
    /// Bitrate in bits per second
    pub bitrate: u32,
    /// Frame size in samples
    pub frame_size: usize,
    /// RTP payload type (if standard)
    pub payload_type: Option<u8>,
}

/// Kind of frame carried by one 10 ms slot of the bitstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// Nothing was sent for this frame (DTX pause)
    Untransmitted,
    /// Full 80-bit speech frame
    Speech,
    /// Silence insertion descriptor
    Sid,
}

impl FrameType {
    /// Numeric code used in the decoder parameter vector
    pub fn code(self) -> i16 {
        match self {
            Self::Untransmitted => 0,
            Self::Speech => 1,
            Self::Sid => 2,
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untransmitted => write!(f, "untransmitted"),
            Self::Speech => write!(f, "speech"),
            Self::Sid => write!(f, "SID"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_codes() {
        assert_eq!(FrameType::Untransmitted.code(), 0);
        assert_eq!(FrameType::Speech.code(), 1);
        assert_eq!(FrameType::Sid.code(), 2);
        assert_eq!(FrameType::Sid.to_string(), "SID");
    }
}
