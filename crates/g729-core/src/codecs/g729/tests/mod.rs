//! Scenario tests running the encoder and decoder together

mod codec;
mod determinism;
mod dtx;
mod erasure;

use super::L_FRAME;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// `frames` frames of a sine wave
pub(super) fn sine(freq: f64, amplitude: f64, frames: usize) -> Vec<i16> {
    (0..frames * L_FRAME)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * freq * n as f64 / 8000.0;
            (amplitude * phase.sin()).round().clamp(-32768.0, 32767.0) as i16
        })
        .collect()
}

/// Vowel-like test signal: a pulse train at `pitch` Hz through a resonance
pub(super) fn voiced(pitch: f64, frames: usize, seed: u64) -> Vec<i16> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let period = (8000.0 / pitch) as usize;
    let mut y1: f64 = 0.0;
    let mut y2: f64 = 0.0;
    (0..frames * L_FRAME)
        .map(|n| {
            let x = if n % period == 0 { 6000.0 } else { 0.0 } + rng.gen_range(-50.0..50.0);
            // resonance near 600 Hz
            let y = x + 1.6 * y1 - 0.81 * y2;
            y2 = y1;
            y1 = y;
            (y * 0.5).clamp(-32768.0, 32767.0) as i16
        })
        .collect()
}

/// Mean square of a block of samples
pub(super) fn energy(samples: &[i16]) -> f64 {
    samples.iter().map(|&s| f64::from(s).powi(2)).sum::<f64>() / samples.len() as f64
}
