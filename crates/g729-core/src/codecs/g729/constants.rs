//! Frame geometry and fixed tuning constants

use super::basic_op::{Word16, Word32};

/// Samples per frame (10 ms at 8 kHz)
pub const L_FRAME: usize = 80;
/// Samples per subframe
pub const L_SUBFR: usize = 40;
/// LP analysis window length
pub const L_WINDOW: usize = 240;
/// Look-ahead samples of the analysis window
pub const L_NEXT: usize = 40;
/// Total speech buffer: analysis window + current frame
pub const L_TOTAL: usize = 240;
/// LP order
pub const M: usize = 10;
/// LP order + 1
pub const MP1: usize = M + 1;
/// Extended autocorrelation order used by the VAD
pub const NP: usize = 12;

pub const PIT_MIN: Word16 = 20;
pub const PIT_MAX: Word16 = 143;
/// Interpolation filter length for the adaptive codebook
pub const L_INTERPOL: usize = 10 + 1;
pub const L_INTER10: usize = 10;
pub const UP_SAMP: Word16 = 3;

/// Excitation history in front of the current frame
pub const EXC_HIST: usize = PIT_MAX as usize + L_INTERPOL;

/// Number of MA predictors for the LSP quantizer
pub const MODE: usize = 2;
/// MA prediction order
pub const MA_NP: usize = 4;
pub const NC: usize = M / 2;
pub const NC0_B: usize = 7;
pub const NC1_B: usize = 5;
pub const NC0: usize = 1 << NC0_B;
pub const NC1: usize = 1 << NC1_B;

/// Number of grid points of the LP to LSP root search
pub const GRID_POINTS: usize = 50;

/// LSF floor, Q13 (0.005)
pub const L_LIMIT: Word16 = 40;
/// LSF ceiling, Q13 (3.135)
pub const M_LIMIT: Word16 = 25681;
pub const GAP1: Word16 = 10;
pub const GAP2: Word16 = 5;
/// Minimum LSF spacing enforced after decoding, Q13 (0.0392)
pub const GAP3: Word16 = 321;

/// Bandwidth expansion of the perceptual weighting filter, Q15
pub const GAMMA1: Word16 = 24576;

/// Pitch sharpening bounds, Q14
pub const SHARPMAX: Word16 = 13017;
pub const SHARPMIN: Word16 = 3277;

/// Adaptive gain clip when the taming procedure triggers, Q14 (0.95)
pub const GPCLIP: Word16 = 15564;
/// Adaptive gain clip inside the gain quantizer, Q9 (0.94)
pub const GPCLIP2: Word16 = 481;
pub const GP0999: Word16 = 16383;
pub const L_THRESH_ERR: Word32 = 983_040_000;

/// Gain quantizer codebook sizes
pub const NCODE1: usize = 8;
pub const NCODE2: usize = 16;
pub const NCAN1: usize = 4;
pub const NCAN2: usize = 8;
pub const INV_COEF: Word16 = -17103;

/// Number of speech parameters per frame
pub const PRM_SIZE: usize = 11;
/// Speech frame size in bytes
pub const SPEECH_FRAME_BYTES: usize = 10;
/// SID frame size in bytes
pub const SID_FRAME_BYTES: usize = 2;

/// Seed of the comfort noise generator
pub const INIT_SEED: Word16 = 11111;
/// Seed of the erasure excitation generator
pub const SEED_FER: Word16 = 21845;

/// Post-filter constants
pub const GAMMA2_PST: Word16 = 18022;
pub const GAMMA1_PST: Word16 = 22938;
pub const MU: Word16 = 26214;
pub const AGC_FAC: Word16 = 29491;
pub const AGC_FAC1: Word16 = 3276;
pub const L_H: usize = 22;
pub const GAMMAP: Word16 = 16384;
pub const INV_GAMMAP: Word16 = 21845;
pub const GAMMAP_2: Word16 = 10923;

/// Annex B: comfort noise and discontinuous transmission
pub const A_GAIN0: Word16 = 28672;
pub const A_GAIN1: Word16 = 4096;
pub const FRAC_THRESH1: Word16 = 4855;
pub const FRAC_THRESH2: Word16 = 3161;
pub const FR_SID_MIN: Word16 = 3;
pub const NB_CURACF: usize = 2;
pub const NB_SUMACF: usize = 3;
pub const NB_GAIN: usize = 2;
pub const SIZ_SUMACF: usize = NB_SUMACF * MP1;
pub const SIZ_ACF: usize = NB_CURACF * MP1;
pub const FRAC1: Word16 = 19043;
pub const K0: Word16 = 24576;
pub const G_MAX: Word16 = 5000;

/// Annex B: SID LSF quantizer search sizes
pub const NB_LSF_CANDIDATES: usize = 4;
