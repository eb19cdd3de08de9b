//! Codec configuration

use std::fmt;

/// How comfort noise parameters travel on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CnPayloadFormat {
    /// 2-byte G.729 Annex B SID frame
    #[default]
    Native,
    /// Generic comfort noise payload of RFC 3389
    Rfc3389,
}

impl fmt::Display for CnPayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native SID"),
            Self::Rfc3389 => write!(f, "RFC 3389 CN"),
        }
    }
}

/// G.729 codec configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct G729Config {
    /// Run the voice activity detector on every frame
    pub vad_enabled: bool,
    /// Replace inactive frames by SID updates and pauses
    pub dtx_enabled: bool,
    /// Apply the adaptive postfilter in the decoder
    pub postfilter: bool,
    /// Comfort noise payload emitted and expected by default
    pub cn_payload: CnPayloadFormat,
}

impl Default for G729Config {
    fn default() -> Self {
        Self {
            vad_enabled: true,
            dtx_enabled: true,
            postfilter: true,
            cn_payload: CnPayloadFormat::Native,
        }
    }
}

impl G729Config {
    /// Create a new G.729 configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable voice activity detection
    pub fn with_vad(mut self, enabled: bool) -> Self {
        self.vad_enabled = enabled;
        self
    }

    /// Enable/disable discontinuous transmission
    /// Has no effect without voice activity detection
    pub fn with_dtx(mut self, enabled: bool) -> Self {
        self.dtx_enabled = enabled;
        self
    }

    /// Enable/disable the decoder postfilter
    pub fn with_postfilter(mut self, enabled: bool) -> Self {
        self.postfilter = enabled;
        self
    }

    /// Select the comfort noise payload format
    pub fn with_cn_payload(mut self, format: CnPayloadFormat) -> Self {
        self.cn_payload = format;
        self
    }

    /// Whether inactive frames are compressed to SID updates
    pub fn silence_suppression(&self) -> bool {
        self.vad_enabled && self.dtx_enabled
    }

    /// Get the G.729 variant name
    pub fn variant(&self) -> &'static str {
        if self.silence_suppression() {
            "G.729AB"
        } else {
            "G.729A"
        }
    }

    /// Get expected bandwidth efficiency vs continuous transmission
    pub fn bandwidth_efficiency(&self) -> f32 {
        if self.silence_suppression() {
            0.5 // ~50% savings in typical conversation
        } else {
            1.0
        }
    }
}
