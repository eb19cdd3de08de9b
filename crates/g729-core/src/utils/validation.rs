//! Input validation utilities for codec operations

use crate::error::{CodecError, Result};

/// Validate that `samples` holds a whole, non-zero number of frames
pub fn validate_frame_multiple(samples: &[i16], frame_size: usize) -> Result<()> {
    if samples.is_empty() || samples.len() % frame_size != 0 {
        return Err(CodecError::InvalidFrameSize {
            expected: frame_size,
            actual: samples.len(),
        });
    }
    Ok(())
}

/// Validate a single-frame PCM buffer
pub fn validate_frame(samples: &[i16], frame_size: usize) -> Result<()> {
    if samples.len() != frame_size {
        return Err(CodecError::InvalidFrameSize {
            expected: frame_size,
            actual: samples.len(),
        });
    }
    Ok(())
}

/// Validate buffer sizes for encoding/decoding operations
pub fn validate_buffer_size(needed: usize, actual: usize) -> Result<()> {
    if actual < needed {
        return Err(CodecError::BufferTooSmall { needed, actual });
    }
    Ok(())
}

/// Validate that a value fits in an unsigned bit-field of `bits` bits
pub fn validate_bit_width(name: &'static str, value: u16, bits: u8) -> Result<()> {
    if u32::from(value) >= (1u32 << bits) {
        return Err(CodecError::ParameterOutOfRange { name, value, bits });
    }
    Ok(())
}
