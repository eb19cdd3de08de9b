//! Taming of the pitch gain
//!
//! Tracks an estimate of the excitation error over the last four pitch
//! zones. When it grows past a threshold the encoder limits the adaptive
//! codebook gain so that a lost frame cannot drive the decoder's long term
//! predictor unstable.

use super::basic_op::*;
use super::constants::{L_INTER10, L_SUBFR, L_THRESH_ERR};
use super::oper_32b::{l_extract, mpy_32_16};
use super::tables::TAB_ZONE;

const EXC_ERR_INIT: Word32 = 0x0000_4000;

/// Excitation error estimate per pitch zone
#[derive(Debug, Clone)]
pub struct ExcErrTracker {
    l_exc_err: [Word32; 4],
}

impl Default for ExcErrTracker {
    fn default() -> Self {
        Self {
            l_exc_err: [EXC_ERR_INIT; 4],
        }
    }
}

impl ExcErrTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the zones reached by a lag of `t0 + frac/3` exceed the
    /// error threshold
    pub fn test_err(&self, t0: Word16, t0_frac: Word16) -> bool {
        let t1 = if t0_frac > 0 { add(t0, 1) } else { t0 };

        let i = sub(t1, (L_SUBFR + L_INTER10) as Word16).max(0);
        let zone1 = TAB_ZONE[i as usize] as usize;
        let zone2 = TAB_ZONE[add(t1, L_INTER10 as Word16 - 2) as usize] as usize;

        let mut l_maxloc: Word32 = -1;
        for i in (zone1..=zone2).rev() {
            if l_sub(self.l_exc_err[i], l_maxloc) > 0 {
                l_maxloc = self.l_exc_err[i];
            }
        }
        l_sub(l_maxloc, L_THRESH_ERR) > 0
    }

    /// Propagate the error through a subframe with the quantized pitch
    /// gain `gain_pit` (Q14) and integer lag `t0`
    pub fn update(&mut self, gain_pit: Word16, t0: Word16) {
        let mut l_worst: Word32 = -1;

        let step = |err: Word32| {
            let (hi, lo) = l_extract(err);
            let l_temp = l_shl(mpy_32_16(hi, lo, gain_pit), 1);
            l_add(EXC_ERR_INIT, l_temp)
        };

        let n = sub(t0, L_SUBFR as Word16);
        if n < 0 {
            // the lag lies within the subframe: the error feeds itself twice
            let l_temp = step(self.l_exc_err[0]);
            if l_sub(l_temp, l_worst) > 0 {
                l_worst = l_temp;
            }
            let l_temp = step(l_temp);
            if l_sub(l_temp, l_worst) > 0 {
                l_worst = l_temp;
            }
        } else {
            let zone1 = TAB_ZONE[n as usize] as usize;
            let zone2 = TAB_ZONE[sub(t0, 1) as usize] as usize;
            for i in zone1..=zone2 {
                let l_temp = step(self.l_exc_err[i]);
                if l_sub(l_temp, l_worst) > 0 {
                    l_worst = l_temp;
                }
            }
        }

        self.l_exc_err.copy_within(0..3, 1);
        self.l_exc_err[0] = l_worst;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::g729::constants::{PIT_MAX, PIT_MIN};

    #[test]
    fn test_fresh_tracker_does_not_tame() {
        let tracker = ExcErrTracker::new();
        for t0 in PIT_MIN..=PIT_MAX {
            assert!(!tracker.test_err(t0, 0));
            assert!(!tracker.test_err(t0, 1));
        }
    }

    #[test]
    fn test_high_gain_on_short_lag_triggers_taming() {
        let mut tracker = ExcErrTracker::new();
        for _ in 0..200 {
            tracker.update(16384 + 3000, 30);
        }
        assert!(tracker.test_err(30, 0));
    }

    #[test]
    fn test_low_gain_settles() {
        let mut tracker = ExcErrTracker::new();
        for _ in 0..200 {
            tracker.update(16384 + 3000, 30);
        }
        for _ in 0..200 {
            tracker.update(4000, 30);
        }
        assert!(!tracker.test_err(30, 0));
    }

    #[test]
    fn test_long_lag_reads_older_zones() {
        let mut tracker = ExcErrTracker::new();
        tracker.update(8192, 100);
        // 1 + 0.5 * e
        assert!(tracker.l_exc_err[0] > EXC_ERR_INIT);
        assert_eq!(tracker.l_exc_err[1], EXC_ERR_INIT);
    }
}
