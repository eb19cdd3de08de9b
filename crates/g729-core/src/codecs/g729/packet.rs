//! RTP payloads of a G.729 stream
//!
//! A G.729 packet (RFC 3551 section 4.5.6) carries zero or more 10-byte
//! speech frames, optionally followed by one 2-byte SID frame which ends the
//! packet. Frames the encoder decides not to send produce no packet at all;
//! the receiver sees the gap in the timestamps. RFC 3389 comfort noise goes
//! in its own packet with the static CN payload type.

use super::constants::{L_FRAME, SPEECH_FRAME_BYTES};

/// Static RTP payload type of G.729
pub const PAYLOAD_TYPE: u8 = 18;
/// Static RTP payload type of RFC 3389 comfort noise
pub const CN_PAYLOAD_TYPE: u8 = 13;

/// One RTP payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct G729Packet {
    /// Index of the first frame, counted from the last reset
    pub frame: u64,
    /// [`PAYLOAD_TYPE`] or [`CN_PAYLOAD_TYPE`]
    pub payload_type: u8,
    /// Payload bytes
    pub payload: Vec<u8>,
}

impl G729Packet {
    /// Packet of G.729 frames starting at `frame`
    pub fn speech(frame: u64) -> Self {
        Self {
            frame,
            payload_type: PAYLOAD_TYPE,
            payload: Vec::with_capacity(2 * SPEECH_FRAME_BYTES),
        }
    }

    /// Packet holding one RFC 3389 comfort noise payload
    pub fn comfort_noise(frame: u64, payload: Vec<u8>) -> Self {
        Self {
            frame,
            payload_type: CN_PAYLOAD_TYPE,
            payload,
        }
    }

    /// Whether this is an RFC 3389 packet
    pub fn is_comfort_noise(&self) -> bool {
        self.payload_type == CN_PAYLOAD_TYPE
    }

    /// Number of 10 ms frames carried
    pub fn frames(&self) -> usize {
        if self.is_comfort_noise() {
            return 1;
        }
        let speech = self.payload.len() / SPEECH_FRAME_BYTES;
        let sid = usize::from(self.payload.len() % SPEECH_FRAME_BYTES != 0);
        speech + sid
    }

    /// RTP timestamp offset of the first frame at 8 kHz
    pub fn timestamp(&self) -> u32 {
        (self.frame as u32).wrapping_mul(L_FRAME as u32)
    }
}
