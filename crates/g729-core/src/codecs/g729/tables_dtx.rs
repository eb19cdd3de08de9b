//! Tables of the silence compression scheme (VAD, DTX, comfort noise)

use super::basic_op::Word16;
use super::constants::{M, MA_NP, MODE, NP};
use super::tables::FG;

/// MA predictors of the SID LSF quantizer: mode 0 is the speech
/// predictor, mode 1 blends 0.6 of mode 0 with 0.4 of the second one
pub const NOISE_FG: [[[Word16; M]; MA_NP]; MODE] = {
    let mut t = [[[0; M]; MA_NP]; MODE];
    let mut i = 0;
    while i < MA_NP {
        let mut j = 0;
        while j < M {
            t[0][i][j] = FG[0][i][j];
            let acc = 2 * (FG[0][i][j] as i32) * 19660 + 2 * (FG[1][i][j] as i32) * 13107;
            t[1][i][j] = (acc >> 16) as Word16;
            j += 1;
        }
        i += 1;
    }
    t
};

/// `1 - sum(NOISE_FG)` per mode, Q15
pub const NOISE_FG_SUM: [[Word16; M]; MODE] = [
    [7798, 8447, 8205, 8293, 8126, 8477, 8447, 8703, 9043, 8604],
    [10514, 12402, 12833, 11914, 11447, 11670, 11132, 11311, 11844, 11447],
];

/// Inverse of [`NOISE_FG_SUM`], Q12
pub const NOISE_FG_SUM_INV: [[Word16; M]; MODE] = [
    [17210, 15888, 16357, 16183, 16516, 15833, 15888, 15421, 14840, 15597],
    [12764, 10821, 10458, 11264, 11724, 11500, 12056, 11865, 11331, 11724],
];

/// First stage subset of the SID LSF quantizer (indices into the first
/// stage speech codebook)
pub const PTR_TAB_1: [Word16; 32] = [
    96, 52, 20, 54, 86, 114, 82, 68, 36, 121, 48, 92, 18, 120, 94, 124, 50, 125, 4, 100, 28, 76,
    12, 117, 81, 22, 90, 116, 127, 21, 108, 66,
];

/// Second stage subsets of the SID LSF quantizer, lower and upper half
pub const PTR_TAB_2: [[Word16; 16]; 2] = [
    [31, 21, 9, 3, 10, 2, 19, 26, 4, 3, 11, 29, 15, 27, 21, 12],
    [16, 1, 0, 0, 8, 25, 22, 20, 19, 23, 20, 31, 4, 31, 20, 31],
];

/// Mean power weights of the first stage SID search per predictor, Q15
pub const MP: [Word16; MODE] = [8022, 7529];

/// LSPs the comfort noise generator starts from
pub const LSP_SID_RESET: [Word16; M] =
    [31441, 27566, 21458, 13612, 4663, -4663, -13612, -21458, -27566, -31441];

/// Quantized SID energies, linear scale
pub const TAB_SIDGAIN: [Word16; 32] = [
    2, 5, 8, 13, 20, 32, 50, 64, 80, 101, 127, 160, 201, 253, 318, 401, 505, 635, 800, 1007, 1268,
    1596, 2010, 2530, 3185, 4009, 5048, 6355, 8000, 10071, 12679, 15962,
];

/// Energy averaging factors per number of summed frames
pub const FACT: [Word16; 3] = [410, 26, 13];
/// Headroom shifts per number of summed frames
pub const MARG: [Word16; 3] = [0, 0, 1];

/// Autocorrelation of the VAD low band filter
pub const LBF_CORR: [Word16; NP + 1] =
    [7869, 7011, 4838, 2299, 321, -660, -782, -484, -164, 3, 39, 21, 4];
