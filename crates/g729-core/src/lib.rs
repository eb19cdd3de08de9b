//! # G729-Core: Fixed-Point G.729 Speech Codec
//!
//! This library implements the 8 kbit/s ITU-T G.729 speech codec in its
//! reduced-complexity form (Annex A) together with the silence compression
//! scheme of Annex B. Everything is computed with the 16/32-bit saturating
//! fixed-point arithmetic the standard prescribes, so encoder and decoder
//! behave deterministically on every platform.
//!
//! ## Features
//!
//! - **Encoder**: LP analysis, LSP quantization, open-loop and closed-loop
//!   pitch search, algebraic codebook search and conjugate-structure gain VQ
//! - **Decoder**: full reconstruction with pitch/formant post-filter and
//!   frame-erasure concealment
//! - **Annex B**: voice activity detection, discontinuous transmission with
//!   2-byte SID frames, and comfort noise generation
//! - **RFC 3389**: comfort noise can also be carried as a generic CN payload
//!
//! ## Usage
//!
//! ```rust
//! use g729_core::{G729Config, G729Decoder, G729Encoder, EncodedFrame};
//!
//! let config = G729Config::default().with_vad(false).with_dtx(false);
//! let mut encoder = G729Encoder::new(config.clone());
//! let mut decoder = G729Decoder::new(config);
//!
//! let pcm = [0i16; 80]; // 10ms at 8kHz
//! let frame = encoder.encode_frame(&pcm)?;
//! assert!(matches!(frame, EncodedFrame::Speech(_)));
//!
//! let decoded = decoder.decode_payload(frame.as_bytes())?;
//! assert_eq!(decoded.len(), 80);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod codecs;
pub mod error;
pub mod types;
pub mod utils;

pub use codecs::g729::{
    CnPayloadFormat, DecodeFlags, EncodedFrame, G729Codec, G729Config, G729Decoder, G729Encoder,
    G729Packet,
};
pub use error::{CodecError, Result};
pub use types::{AudioCodec, AudioCodecExt, CodecInfo, FrameType};

/// Version information for the codec library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the codec library
///
/// Installs a `tracing` subscriber honouring `RUST_LOG` unless the host
/// application already installed one. It's safe to call multiple times.
///
/// # Errors
///
/// Never fails today; the `Result` keeps the signature aligned with the
/// other RVOIP codec crates.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    tracing::info!("G729-Core v{} initialized", VERSION);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
        assert!(init().is_ok());
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
