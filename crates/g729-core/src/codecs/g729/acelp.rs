//! Algebraic (fixed) codebook
//!
//! 17-bit codebook of four signed unit pulses on interleaved tracks:
//!
//! | pulse | positions                                  |
//! |-------|--------------------------------------------|
//! | 0     | 0, 5, 10, ..., 35                          |
//! | 1     | 1, 6, 11, ..., 36                          |
//! | 2     | 2, 7, 12, ..., 37                          |
//! | 3     | 3, 8, ..., 38 and 4, 9, ..., 39            |
//!
//! The encoder runs a depth-first tree search that tries two pulse orders
//! per candidate track of pulse 3.

use super::basic_op::*;
use super::constants::L_SUBFR;
use super::correlation::cor_h_x;

const NB_POS: usize = 8;
const STEP: usize = 5;
const NB_TRACK: usize = 5;

const Q15_1_2: Word16 = 16384;
const Q15_1_4: Word16 = 8192;
const Q15_1_8: Word16 = 4096;
const Q15_1_16: Word16 = 2048;

/// Result of the fixed codebook search for one subframe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcelpIndex {
    /// 13-bit pulse positions
    pub positions: Word16,
    /// 4-bit pulse signs, bit set for a positive pulse
    pub signs: Word16,
}

/// Correlations of the impulse response between all pulse positions
struct PulseCorrelations {
    diag: [[Word16; NB_POS]; NB_TRACK],
    /// `cross[x][y][i][j]` for tracks `x < y`, position `i` of `x` and `j` of `y`
    cross: [[[[Word16; NB_POS]; NB_POS]; NB_TRACK]; NB_TRACK],
}

impl PulseCorrelations {
    fn new(h_in: &[Word16; L_SUBFR]) -> Self {
        let mut cor: Word32 = 0;
        for &v in h_in.iter() {
            cor = l_mac(cor, v, v);
        }

        let mut h = [0; L_SUBFR];
        if extract_h(cor) > 32000 {
            for i in 0..L_SUBFR {
                h[i] = shr(h_in[i], 1);
            }
        } else {
            let k = shr(norm_l(cor), 1);
            for i in 0..L_SUBFR {
                h[i] = shl(h_in[i], k);
            }
        }

        // phi(p, q) = sum(h[l] * h[l + |p - q|], l = 0..=39 - max(p, q))
        let phi = |p: usize, q: usize| -> Word16 {
            let (lo, hi) = if p < q { (p, q) } else { (q, p) };
            let d = hi - lo;
            let mut s = 0;
            for l in 0..L_SUBFR - hi {
                s = l_mac(s, h[l], h[l + d]);
            }
            extract_h(s)
        };

        let mut diag = [[0; NB_POS]; NB_TRACK];
        for (t, row) in diag.iter_mut().enumerate() {
            for (i, v) in row.iter_mut().enumerate() {
                let p = t + STEP * i;
                *v = phi(p, p);
            }
        }

        let mut cross = [[[[0; NB_POS]; NB_POS]; NB_TRACK]; NB_TRACK];
        for x in 0..NB_TRACK {
            for y in x + 1..NB_TRACK {
                if x == 3 {
                    continue;
                }
                for i in 0..NB_POS {
                    for j in 0..NB_POS {
                        cross[x][y][i][j] = phi(x + STEP * i, y + STEP * j);
                    }
                }
            }
        }

        Self { diag, cross }
    }

    /// Fold the pulse signs into the cross terms
    fn apply_signs(&mut self, sign_dn: &[Word16; L_SUBFR]) {
        for x in 0..3 {
            for y in x + 1..NB_TRACK {
                for i in 0..NB_POS {
                    let positive_x = sign_dn[x + STEP * i] >= 0;
                    for j in 0..NB_POS {
                        let positive_y = sign_dn[y + STEP * j] >= 0;
                        let s = if positive_x == positive_y { MAX_16 } else { MIN_16 };
                        self.cross[x][y][i][j] = mult(self.cross[x][y][i][j], s);
                    }
                }
            }
        }
    }
}

#[inline]
fn pos_index(p: usize) -> usize {
    p / STEP
}

/// Largest `dn` on a track, skipping one position
fn track_max(dn: &[Word16; L_SUBFR], track: usize, skip: Option<usize>) -> usize {
    let mut max = -1;
    let mut best = track;
    for j in (track..L_SUBFR).step_by(STEP) {
        if dn[j] > max && skip != Some(j) {
            max = dn[j];
            best = j;
        }
    }
    best
}

/// Best-so-far criterion `sq / alp`, compared by cross multiplication
#[derive(Clone, Copy)]
struct Criterion {
    sq: Word16,
    alp: Word16,
}

impl Criterion {
    const START: Self = Self { sq: -1, alp: 1 };

    /// `sq2 / alp2 > sq / alp`
    #[inline]
    fn beaten_by(&self, sq2: Word16, alp2: Word16) -> bool {
        l_msu(l_mult(self.alp, sq2), self.sq, alp2) > 0
    }
}

/// Fixed codebook search
///
/// # Arguments
/// * `x` - Target vector
/// * `h` - Impulse response of the weighted synthesis filter, Q12
/// * `t0` - Integer pitch lag, used for the pitch sharpening of the codeword
/// * `pitch_sharp` - Last quantized pitch gain, Q14
/// * `code` - Output codeword, Q13
/// * `y` - Output filtered codeword, Q12
pub fn acelp_code_a(
    x: &[Word16],
    h: &[Word16; L_SUBFR],
    t0: Word16,
    pitch_sharp: Word16,
    code: &mut [Word16; L_SUBFR],
    y: &mut [Word16; L_SUBFR],
) -> AcelpIndex {
    let mut h = *h;
    let sharp = shl(pitch_sharp, 1);
    let t0 = t0 as usize;
    if t0 < L_SUBFR {
        for i in t0..L_SUBFR {
            h[i] = add(h[i], mult(h[i - t0], sharp));
        }
    }

    let mut rr = PulseCorrelations::new(&h);
    let mut dn = [0; L_SUBFR];
    cor_h_x(&h, x, &mut dn);

    let index = d4i40_17_fast(&mut dn, &mut rr, &h, code, y);

    if t0 < L_SUBFR {
        for i in t0..L_SUBFR {
            code[i] = add(code[i], mult(code[i - t0], sharp));
        }
    }
    index
}

fn d4i40_17_fast(
    dn: &mut [Word16; L_SUBFR],
    rr: &mut PulseCorrelations,
    h: &[Word16; L_SUBFR],
    cod: &mut [Word16; L_SUBFR],
    y: &mut [Word16; L_SUBFR],
) -> AcelpIndex {
    let mut sign_dn = [0; L_SUBFR];
    for i in 0..L_SUBFR {
        if dn[i] >= 0 {
            sign_dn[i] = MAX_16;
        } else {
            sign_dn[i] = MIN_16;
            dn[i] = negate(dn[i]);
        }
    }
    rr.apply_signs(&sign_dn);
    let rr = &*rr;

    let mut best = Criterion::START;
    let (mut ip0, mut ip1, mut ip2, mut ip3) = (0, 1, 2, 3);
    let mut tmp_vect = [0; NB_POS];

    for tr in 3..5 {
        // Order 2 -> tr -> 0 -> 1
        let mut crit = Criterion::START;
        let (mut ix, mut iy, mut ps) = (0, 0, 0);
        let mut prev_i0 = None;
        for _ in 0..2 {
            let i0 = track_max(dn, 2, prev_i0);
            prev_i0 = Some(i0);
            let j = pos_index(i0);
            let ps1 = dn[i0];
            let alp1 = l_mult(rr.diag[2][j], Q15_1_4);

            for i1 in (tr..L_SUBFR).step_by(STEP) {
                let k = pos_index(i1);
                let ps2 = add(ps1, dn[i1]);
                let alp_16 = round(l_mac(
                    l_mac(alp1, rr.cross[2][tr][j][k], Q15_1_2),
                    rr.diag[tr][k],
                    Q15_1_4,
                ));
                let sq2 = mult(ps2, ps2);
                if crit.beaten_by(sq2, alp_16) {
                    crit = Criterion { sq: sq2, alp: alp_16 };
                    ps = ps2;
                    ix = i0;
                    iy = i1;
                }
            }
        }
        let (i0, i1) = (ix, iy);
        let (j0, j1) = (pos_index(i0), pos_index(i1));

        let ps0 = ps;
        let alp0 = l_mult(crit.alp, Q15_1_4);
        let mut crit = Criterion::START;

        for (k, v) in tmp_vect.iter_mut().enumerate() {
            let mut s = l_mult(rr.cross[1][2][k][j0], Q15_1_4);
            s = l_mac(s, rr.cross[1][tr][k][j1], Q15_1_4);
            s = l_mac(s, rr.diag[1][k], Q15_1_8);
            *v = round(s);
        }

        for i2 in (0..L_SUBFR).step_by(STEP) {
            let k2 = pos_index(i2);
            let ps1 = add(ps0, dn[i2]);
            let mut alp1 = l_mac(alp0, rr.cross[0][2][k2][j0], Q15_1_8);
            alp1 = l_mac(alp1, rr.cross[0][tr][k2][j1], Q15_1_8);
            alp1 = l_mac(alp1, rr.diag[0][k2], Q15_1_16);

            for i3 in (1..L_SUBFR).step_by(STEP) {
                let k3 = pos_index(i3);
                let ps2 = add(ps1, dn[i3]);
                let s = l_mac(alp1, rr.cross[0][1][k2][k3], Q15_1_8);
                let alp_16 = round(l_mac(s, tmp_vect[k3], Q15_1_2));
                let sq2 = mult(ps2, ps2);
                if crit.beaten_by(sq2, alp_16) {
                    crit = Criterion { sq: sq2, alp: alp_16 };
                    ix = i2;
                    iy = i3;
                }
            }
        }

        if best.beaten_by(crit.sq, crit.alp) {
            best = crit;
            ip2 = i0;
            ip3 = i1;
            ip0 = ix;
            ip1 = iy;
        }

        // Order tr -> 0 -> 2 -> 1
        let mut crit = Criterion::START;
        let mut prev_i0 = None;
        for _ in 0..2 {
            let i0 = track_max(dn, tr, prev_i0);
            prev_i0 = Some(i0);
            let j = pos_index(i0);
            let ps1 = dn[i0];
            let alp1 = l_mult(rr.diag[tr][j], Q15_1_4);

            for i1 in (0..L_SUBFR).step_by(STEP) {
                let k = pos_index(i1);
                let ps2 = add(ps1, dn[i1]);
                let alp_16 = round(l_mac(
                    l_mac(alp1, rr.cross[0][tr][k][j], Q15_1_2),
                    rr.diag[0][k],
                    Q15_1_4,
                ));
                let sq2 = mult(ps2, ps2);
                if crit.beaten_by(sq2, alp_16) {
                    crit = Criterion { sq: sq2, alp: alp_16 };
                    ps = ps2;
                    ix = i0;
                    iy = i1;
                }
            }
        }
        let (i0, i1) = (ix, iy);
        let (j0, j1) = (pos_index(i0), pos_index(i1));

        let ps0 = ps;
        let alp0 = l_mult(crit.alp, Q15_1_4);
        let mut crit = Criterion::START;

        for (k, v) in tmp_vect.iter_mut().enumerate() {
            let mut s = l_mult(rr.cross[1][tr][k][j0], Q15_1_4);
            s = l_mac(s, rr.cross[0][1][j1][k], Q15_1_4);
            s = l_mac(s, rr.diag[1][k], Q15_1_8);
            *v = round(s);
        }

        for i2 in (2..L_SUBFR).step_by(STEP) {
            let k2 = pos_index(i2);
            let ps1 = add(ps0, dn[i2]);
            let mut alp1 = l_mac(alp0, rr.cross[2][tr][k2][j0], Q15_1_8);
            alp1 = l_mac(alp1, rr.cross[0][2][j1][k2], Q15_1_8);
            alp1 = l_mac(alp1, rr.diag[2][k2], Q15_1_16);

            for i3 in (1..L_SUBFR).step_by(STEP) {
                let k3 = pos_index(i3);
                let ps2 = add(ps1, dn[i3]);
                let s = l_mac(alp1, rr.cross[1][2][k3][k2], Q15_1_8);
                let alp_16 = round(l_mac(s, tmp_vect[k3], Q15_1_2));
                let sq2 = mult(ps2, ps2);
                if crit.beaten_by(sq2, alp_16) {
                    crit = Criterion { sq: sq2, alp: alp_16 };
                    ix = i2;
                    iy = i3;
                }
            }
        }

        if best.beaten_by(crit.sq, crit.alp) {
            best = crit;
            ip0 = i1;
            ip1 = iy;
            ip2 = ix;
            ip3 = i0;
        }
    }

    let pulses = [ip0, ip1, ip2, ip3];
    cod.fill(0);
    y.fill(0);
    let mut signs = 0;
    for (n, &p) in pulses.iter().enumerate() {
        let s = sign_dn[p];
        cod[p] = shr(s, 2);
        if s > 0 {
            signs |= 1 << n;
            for (i, j) in (p..L_SUBFR).zip(0..) {
                y[i] = add(y[i], h[j]);
            }
        } else {
            for (i, j) in (p..L_SUBFR).zip(0..) {
                y[i] = sub(y[i], h[j]);
            }
        }
    }

    let p3 = pos_index(ip3);
    let jx = (ip3 - (p3 * STEP + 3)) as Word16;
    let code3 = add(shl(p3 as Word16, 1), jx);

    let mut positions = pos_index(ip0) as Word16;
    positions = add(positions, shl(pos_index(ip1) as Word16, 3));
    positions = add(positions, shl(pos_index(ip2) as Word16, 6));
    positions = add(positions, shl(code3, 9));

    AcelpIndex { positions, signs }
}

/// Rebuild the fixed codeword from its indices, Q13
pub fn decod_acelp(sign: Word16, index: Word16, cod: &mut [Word16; L_SUBFR]) {
    let pos = pulse_positions(index);

    cod.fill(0);
    for (j, &p) in pos.iter().enumerate() {
        cod[p] = if (sign >> j) & 1 != 0 { 8191 } else { -8192 };
    }
}

/// Pulse positions of a 13-bit position index
pub fn pulse_positions(index: Word16) -> [usize; 4] {
    let mut index = index;
    let i = (index & 7) as usize;
    let p0 = i * STEP;

    index = shr(index, 3);
    let p1 = (index & 7) as usize * STEP + 1;

    index = shr(index, 3);
    let p2 = (index & 7) as usize * STEP + 2;

    index = shr(index, 3);
    let j = (index & 1) as usize;
    index = shr(index, 1);
    let p3 = (index & 7) as usize * STEP + 3 + j;

    [p0, p1, p2, p3]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_response() -> [Word16; L_SUBFR] {
        let mut h = [0; L_SUBFR];
        let mut v = 4096.0f64;
        for x in h.iter_mut() {
            *x = v as Word16;
            v *= -0.6;
        }
        h
    }

    #[test]
    fn test_positions_roundtrip() {
        for index in 0..(1 << 13) {
            let pos = pulse_positions(index);
            assert_eq!(pos[0] % 5, 0);
            assert_eq!(pos[1] % 5, 1);
            assert_eq!(pos[2] % 5, 2);
            assert!(pos[3] % 5 == 3 || pos[3] % 5 == 4);
            assert!(pos.iter().all(|&p| p < L_SUBFR));
        }
    }

    #[test]
    fn test_search_finds_planted_pulses() {
        let h = impulse_response();
        let planted = [10usize, 21, 32, 4];
        let signs = [1i32, -1, 1, 1];
        let mut x = [0i16; L_SUBFR];
        for (&p, &s) in planted.iter().zip(signs.iter()) {
            for i in p..L_SUBFR {
                x[i] = (x[i] as i32 + s * h[i - p] as i32 / 2) as i16;
            }
        }

        let mut code = [0; L_SUBFR];
        let mut y = [0; L_SUBFR];
        let idx = acelp_code_a(&x, &h, 60, 3277, &mut code, &mut y);

        let mut found = pulse_positions(idx.positions);
        found.sort_unstable();
        let mut expected = planted;
        expected.sort_unstable();
        assert_eq!(found, expected);

        let mut decoded = [0; L_SUBFR];
        decod_acelp(idx.signs, idx.positions, &mut decoded);
        for &p in planted.iter() {
            assert_eq!(decoded[p].signum(), code[p].signum());
            assert!(code[p].abs() >= 8191);
        }
        assert_eq!(decoded[21], -8192);
    }

    #[test]
    fn test_encoder_codeword_matches_decoder() {
        let h = impulse_response();
        let x: Vec<i16> = (0..L_SUBFR).map(|i| ((i * 7919) % 4001) as i16 - 2000).collect();
        let mut code = [0; L_SUBFR];
        let mut y = [0; L_SUBFR];
        let idx = acelp_code_a(&x, &h, 80, 3277, &mut code, &mut y);
        let mut decoded = [0; L_SUBFR];
        decod_acelp(idx.signs, idx.positions, &mut decoded);
        for i in 0..L_SUBFR {
            assert!((code[i] - decoded[i]).abs() <= 1, "{i}");
        }
        assert_eq!(code.iter().filter(|&&c| c != 0).count(), 4);
    }

    #[test]
    fn test_pitch_sharpening_repeats_pulses() {
        let h = impulse_response();
        let x: Vec<i16> = (0..L_SUBFR).map(|i| ((i * 7919) % 4001) as i16 - 2000).collect();
        let mut code = [0; L_SUBFR];
        let mut y = [0; L_SUBFR];
        let idx = acelp_code_a(&x, &h, 20, 13107, &mut code, &mut y);

        let mut expected = [0; L_SUBFR];
        decod_acelp(idx.signs, idx.positions, &mut expected);
        for i in 20..L_SUBFR {
            expected[i] = add(expected[i], mult(expected[i - 20], 26214));
        }
        assert_eq!(code, expected);
    }
}
