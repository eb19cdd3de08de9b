//! Error handling for the G.729 codec
//!
//! The signal-processing core never fails: numeric trouble is absorbed by
//! saturation, rescaling and fallbacks. Errors only surface at the boundary
//! where callers hand us PCM buffers, byte payloads or configuration.

#![allow(missing_docs)]

use std::fmt;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Error type for codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Invalid codec configuration
    #[error("Invalid codec configuration: {details}")]
    InvalidConfig { details: String },

    /// Invalid frame size
    #[error("Invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}Hz (supported: {supported:?})")]
    InvalidSampleRate { rate: u32, supported: Vec<u32> },

    /// Invalid channel count
    #[error("Invalid channel count: {channels} (supported: {supported:?})")]
    InvalidChannelCount { channels: u8, supported: Vec<u8> },

    /// Buffer too small for operation
    #[error("Buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// Invalid payload data
    #[error("Invalid payload data: {details}")]
    InvalidPayload { details: String },

    /// A parameter value does not fit its bit-field
    #[error("Parameter {name} out of range: {value} does not fit in {bits} bits")]
    ParameterOutOfRange {
        name: &'static str,
        value: u16,
        bits: u8,
    },

    /// The frames of one buffer do not fit a single packet
    #[error("Frame {frame} of the buffer follows a DTX transition; encode it in its own packet")]
    DtxBoundary { frame: usize },
}

impl CodecError {
    /// Create a new invalid configuration error
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a new invalid payload error
    pub fn invalid_payload(details: impl Into<String>) -> Self {
        Self::InvalidPayload {
            details: details.into(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// Per-frame problems (a bad payload, a short buffer) only affect the
    /// current frame; the caller can conceal it and carry on.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig { .. }
            | Self::InvalidSampleRate { .. }
            | Self::InvalidChannelCount { .. } => false,

            Self::InvalidFrameSize { .. }
            | Self::BufferTooSmall { .. }
            | Self::InvalidPayload { .. }
            | Self::ParameterOutOfRange { .. }
            | Self::DtxBoundary { .. } => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. }
            | Self::InvalidSampleRate { .. }
            | Self::InvalidChannelCount { .. } => ErrorCategory::Configuration,

            Self::InvalidFrameSize { .. }
            | Self::InvalidPayload { .. }
            | Self::ParameterOutOfRange { .. }
            | Self::DtxBoundary { .. } => ErrorCategory::Processing,

            Self::BufferTooSmall { .. } => ErrorCategory::Memory,
        }
    }
}

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration and parameter errors
    Configuration,
    /// Audio processing errors
    Processing,
    /// Memory management errors
    Memory,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Processing => write!(f, "Processing"),
            Self::Memory => write!(f, "Memory"),
        }
    }
}
