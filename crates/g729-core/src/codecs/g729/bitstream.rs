//! Bitstream packing and unpacking
//!
//! A speech frame carries 15 parameters in 80 bits, a SID frame 4
//! parameters in 15 bits padded to two bytes. Fields are written MSB first
//! in transmission order.

use super::basic_op::Word16;
use super::constants::{SID_FRAME_BYTES, SPEECH_FRAME_BYTES};
use crate::error::{CodecError, Result};
use crate::utils::validation::validate_bit_width;

/// Parameters of one speech frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpeechParams {
    /// MA predictor switch
    pub l0: u16,
    /// First stage LSP codebook index
    pub l1: u16,
    /// Second stage, lower half
    pub l2: u16,
    /// Second stage, upper half
    pub l3: u16,
    /// Pitch delay of the first subframe
    pub p1: u16,
    /// Parity of `p1`
    pub p0: u16,
    /// Pulse positions of the first subframe
    pub c1: u16,
    /// Pulse signs of the first subframe
    pub s1: u16,
    /// First stage gain index of the first subframe
    pub ga1: u16,
    /// Second stage gain index of the first subframe
    pub gb1: u16,
    /// Relative pitch delay of the second subframe
    pub p2: u16,
    /// Pulse positions of the second subframe
    pub c2: u16,
    /// Pulse signs of the second subframe
    pub s2: u16,
    /// First stage gain index of the second subframe
    pub ga2: u16,
    /// Second stage gain index of the second subframe
    pub gb2: u16,
}

/// Field names and widths of a speech frame in transmission order
pub const SPEECH_FIELDS: [(&str, u8); 15] = [
    ("L0", 1),
    ("L1", 7),
    ("L2", 5),
    ("L3", 5),
    ("P1", 8),
    ("P0", 1),
    ("C1", 13),
    ("S1", 4),
    ("GA1", 3),
    ("GB1", 4),
    ("P2", 5),
    ("C2", 13),
    ("S2", 4),
    ("GA2", 3),
    ("GB2", 4),
];

/// Field names and widths of a SID frame in transmission order
pub const SID_FIELDS: [(&str, u8); 4] = [("L0", 1), ("L1", 5), ("L2", 4), ("Gain", 5)];

impl SpeechParams {
    /// Values in transmission order
    pub fn to_array(&self) -> [u16; 15] {
        [
            self.l0, self.l1, self.l2, self.l3, self.p1, self.p0, self.c1, self.s1, self.ga1,
            self.gb1, self.p2, self.c2, self.s2, self.ga2, self.gb2,
        ]
    }

    /// Build from values in transmission order
    pub fn from_array(v: [u16; 15]) -> Self {
        Self {
            l0: v[0],
            l1: v[1],
            l2: v[2],
            l3: v[3],
            p1: v[4],
            p0: v[5],
            c1: v[6],
            s1: v[7],
            ga1: v[8],
            gb1: v[9],
            p2: v[10],
            c2: v[11],
            s2: v[12],
            ga2: v[13],
            gb2: v[14],
        }
    }

    /// Check every field against its bit width
    pub fn validate(&self) -> Result<()> {
        for (&(name, bits), value) in SPEECH_FIELDS.iter().zip(self.to_array()) {
            validate_bit_width(name, value, bits)?;
        }
        Ok(())
    }

    /// Build from the encoder's parameter vector
    ///
    /// `prm` holds the combined LSP words `L0|L1` and `L2|L3`, then for each
    /// subframe the pitch index, (parity), positions, signs and the 7-bit
    /// gain index.
    pub(crate) fn from_prm(prm: &[Word16; 11]) -> Self {
        let u = |v: Word16| v as u16;
        Self {
            l0: u(prm[0]) >> 7 & 0x1,
            l1: u(prm[0]) & 0x7f,
            l2: u(prm[1]) >> 5 & 0x1f,
            l3: u(prm[1]) & 0x1f,
            p1: u(prm[2]) & 0xff,
            p0: u(prm[3]) & 0x1,
            c1: u(prm[4]) & 0x1fff,
            s1: u(prm[5]) & 0xf,
            ga1: u(prm[6]) >> 4 & 0x7,
            gb1: u(prm[6]) & 0xf,
            p2: u(prm[7]) & 0x1f,
            c2: u(prm[8]) & 0x1fff,
            s2: u(prm[9]) & 0xf,
            ga2: u(prm[10]) >> 4 & 0x7,
            gb2: u(prm[10]) & 0xf,
        }
    }

    /// Inverse of [`SpeechParams::from_prm`]
    pub(crate) fn to_prm(self) -> [Word16; 11] {
        let w = |v: u16| v as Word16;
        [
            w(self.l0 << 7 | self.l1),
            w(self.l2 << 5 | self.l3),
            w(self.p1),
            w(self.p0),
            w(self.c1),
            w(self.s1),
            w(self.ga1 << 4 | self.gb1),
            w(self.p2),
            w(self.c2),
            w(self.s2),
            w(self.ga2 << 4 | self.gb2),
        ]
    }
}

/// Parameters of one SID frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SidParams {
    /// MA predictor switch of the noise quantizer
    pub l0: u16,
    /// First stage index (subset of the speech codebook)
    pub l1: u16,
    /// Second stage index
    pub l2: u16,
    /// Quantized energy
    pub gain: u16,
}

impl SidParams {
    /// Values in transmission order
    pub fn to_array(&self) -> [u16; 4] {
        [self.l0, self.l1, self.l2, self.gain]
    }

    /// Check every field against its bit width
    pub fn validate(&self) -> Result<()> {
        for (&(name, bits), value) in SID_FIELDS.iter().zip(self.to_array()) {
            validate_bit_width(name, value, bits)?;
        }
        Ok(())
    }
}

/// Write `num_bits` of `value` MSB first
fn write_bits(packed: &mut [u8], bit_pos: &mut usize, value: u16, num_bits: u8) {
    for i in 0..num_bits {
        let bit = (value >> (num_bits - 1 - i)) & 1;
        let byte_idx = *bit_pos / 8;
        let bit_idx = 7 - (*bit_pos % 8);

        if bit == 1 {
            packed[byte_idx] |= 1 << bit_idx;
        } else {
            packed[byte_idx] &= !(1 << bit_idx);
        }

        *bit_pos += 1;
    }
}

/// Read `num_bits` MSB first
fn read_bits(packed: &[u8], bit_pos: &mut usize, num_bits: u8) -> u16 {
    let mut value = 0u16;

    for _ in 0..num_bits {
        let byte_idx = *bit_pos / 8;
        let bit_idx = 7 - (*bit_pos % 8);
        let bit = (packed[byte_idx] >> bit_idx) & 1;
        value = (value << 1) | u16::from(bit);
        *bit_pos += 1;
    }

    value
}

/// Pack a speech frame into 10 bytes
///
/// Fields wider than their slot are truncated; call
/// [`SpeechParams::validate`] first to reject them instead.
pub fn pack_speech(params: &SpeechParams) -> [u8; SPEECH_FRAME_BYTES] {
    let mut packed = [0u8; SPEECH_FRAME_BYTES];
    let mut bit_pos = 0;
    for (&(_, bits), value) in SPEECH_FIELDS.iter().zip(params.to_array()) {
        write_bits(&mut packed, &mut bit_pos, value & ((1 << bits) - 1), bits);
    }
    packed
}

/// Unpack a 10-byte speech frame
pub fn unpack_speech(data: &[u8]) -> Result<SpeechParams> {
    if data.len() != SPEECH_FRAME_BYTES {
        return Err(CodecError::InvalidFrameSize {
            expected: SPEECH_FRAME_BYTES,
            actual: data.len(),
        });
    }
    let mut bit_pos = 0;
    let mut values = [0u16; 15];
    for (v, &(_, bits)) in values.iter_mut().zip(SPEECH_FIELDS.iter()) {
        *v = read_bits(data, &mut bit_pos, bits);
    }
    Ok(SpeechParams::from_array(values))
}

/// Pack a SID frame into 2 bytes, the last bit is zero
pub fn pack_sid(params: &SidParams) -> [u8; SID_FRAME_BYTES] {
    let mut packed = [0u8; SID_FRAME_BYTES];
    let mut bit_pos = 0;
    for (&(_, bits), value) in SID_FIELDS.iter().zip(params.to_array()) {
        write_bits(&mut packed, &mut bit_pos, value & ((1 << bits) - 1), bits);
    }
    packed
}

/// Unpack a 2-byte SID frame
pub fn unpack_sid(data: &[u8]) -> Result<SidParams> {
    if data.len() != SID_FRAME_BYTES {
        return Err(CodecError::InvalidFrameSize {
            expected: SID_FRAME_BYTES,
            actual: data.len(),
        });
    }
    let mut bit_pos = 0;
    let l0 = read_bits(data, &mut bit_pos, SID_FIELDS[0].1);
    let l1 = read_bits(data, &mut bit_pos, SID_FIELDS[1].1);
    let l2 = read_bits(data, &mut bit_pos, SID_FIELDS[2].1);
    let gain = read_bits(data, &mut bit_pos, SID_FIELDS[3].1);
    Ok(SidParams { l0, l1, l2, gain })
}
