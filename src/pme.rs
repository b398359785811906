// Copyright 2026 The multipolar authors
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Particle-mesh Ewald reciprocal-space kernel.
//!
//! Multipole densities are spread onto a regular grid with cardinal
//! B-splines of order six (even order keeps the Essmann b-factors regular
//! at the Nyquist mode; the C⁴ continuity covers the fourth potential
//! derivative required by octupole forces). The grid is Fourier
//! transformed, multiplied by the Ewald influence function, transformed
//! back, and the resulting potential (with derivatives through rank four)
//! is interpolated back at each site.
//!
//! Everything here works in bare units of e²/nm; the Coulomb prefactor is
//! applied by the caller. Grids are evaluation-scoped scratch.

use crate::realspace::Moments;
use crate::tensor::{axial, Symmetric2, Symmetric3, Symmetric4, SYM2_INDICES, SYM2_MULT,
    SYM3_INDICES, SYM3_MULT, SYM4_INDICES};
use crate::Point;
use itertools::iproduct;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Interpolation order of the cardinal B-splines.
pub const PME_ORDER: usize = 6;

const SQRT_PI: f64 = 1.7724538509055159;

/// Values and derivatives 0..4 of the order-6 cardinal B-spline at the
/// points `w + j`, `j = 0..5`, for `w ∈ [0, 1)`.
///
/// `M_n(x) = [x·M_{n−1}(x) + (n−x)·M_{n−1}(x−1)]/(n−1)` and
/// `M_n′(x) = M_{n−1}(x) − M_{n−1}(x−1)`, so the d-th derivative of `M₆`
/// is an alternating binomial combination of `M_{6−d}` values.
fn bspline_ladder(w: f64) -> [[f64; PME_ORDER]; 5] {
    // vals[n−1][j] = M_n(w + j)
    let mut vals = [[0.0; PME_ORDER]; PME_ORDER];
    vals[0][0] = 1.0; // M₁ is the box function
    for n in 2..=PME_ORDER {
        for j in (0..n).rev() {
            let x = w + j as f64;
            let prev_here = if j < n - 1 { vals[n - 2][j] } else { 0.0 };
            let prev_left = if j > 0 { vals[n - 2][j - 1] } else { 0.0 };
            vals[n - 1][j] = (x * prev_here + (n as f64 - x) * prev_left) / (n as f64 - 1.0);
        }
    }
    const BINOMIAL: [[f64; 5]; 5] = [
        [1.0, 0.0, 0.0, 0.0, 0.0],
        [1.0, -1.0, 0.0, 0.0, 0.0],
        [1.0, -2.0, 1.0, 0.0, 0.0],
        [1.0, -3.0, 3.0, -1.0, 0.0],
        [1.0, -4.0, 6.0, -4.0, 1.0],
    ];
    let mut out = [[0.0; PME_ORDER]; 5];
    for d in 0..5 {
        let base = PME_ORDER - d; // spline order whose values enter M₆⁽ᵈ⁾
        for j in 0..PME_ORDER {
            let mut sum = 0.0;
            for (t, coeff) in BINOMIAL[d].iter().enumerate().take(d + 1) {
                if j >= t && j - t < base {
                    sum += coeff * vals[base - 1][j - t];
                }
            }
            out[d][j] = sum;
        }
    }
    out
}

/// Potential and its derivatives through rank four at one site.
#[derive(Clone, Debug, Default)]
pub struct SitePotential {
    pub phi: f64,
    pub d1: Point,
    pub d2: Symmetric2,
    pub d3: Symmetric3,
    pub d4: Symmetric4,
}

impl SitePotential {
    /// Energy of a moment set in this potential.
    pub fn energy(&self, m: &Moments) -> f64 {
        m.q * self.phi
            + m.d.dot(&self.d1)
            + m.quad.full_dot(&self.d2) / 3.0
            + m.oct.full_dot(&self.d3) / 15.0
    }

    /// Force on a moment set, `−∇(energy)`.
    pub fn force(&self, m: &Moments) -> Point {
        -(self.d1 * m.q
            + self.d2.dot_vec(&m.d)
            + self.d3.contract_sym2(&m.quad) / 3.0
            + self.d4.contract_sym3(&m.oct) / 15.0)
    }

    /// Torque on a moment set, the rotational gradient of the energy.
    pub fn torque(&self, m: &Moments) -> Point {
        -(m.d.cross(&self.d1)
            + axial(&m.quad.matmul(&self.d2)) * (2.0 / 3.0)
            + axial(&m.oct.cross_matrix(&self.d3)) / 5.0)
    }

    /// Electrostatic field at the site.
    pub fn field(&self) -> Point {
        -self.d1
    }
}

/// Reciprocal-space workspace for one box/grid geometry.
pub struct Pme {
    alpha: f64,
    grid: [usize; 3],
    box_len: Point,
    /// 2·G(m): influence function with the potential-normalization factor
    /// folded in, zero at m = 0.
    influence: Vec<f64>,
    forward: [Arc<dyn Fft<f64>>; 3],
    inverse: [Arc<dyn Fft<f64>>; 3],
}

impl Pme {
    pub fn new(alpha: f64, grid: [usize; 3], box_len: Point) -> Self {
        let mut planner = FftPlanner::new();
        let forward = [
            planner.plan_fft_forward(grid[0]),
            planner.plan_fft_forward(grid[1]),
            planner.plan_fft_forward(grid[2]),
        ];
        let inverse = [
            planner.plan_fft_inverse(grid[0]),
            planner.plan_fft_inverse(grid[1]),
            planner.plan_fft_inverse(grid[2]),
        ];

        // |b(m)|⁻² moduli per axis from the spline values at the knots
        let knots = bspline_ladder(0.0)[0]; // M₆(0..5)
        let bsq_axis = |k: usize| -> Vec<f64> {
            (0..k)
                .map(|m| {
                    let mut denom = Complex::new(0.0, 0.0);
                    for (j, theta) in knots.iter().enumerate().skip(1) {
                        // M₆(j) for j = 1..5
                        let phase = 2.0 * std::f64::consts::PI * (m * (j - 1)) as f64 / k as f64;
                        denom += Complex::new(phase.cos(), phase.sin()) * *theta;
                    }
                    1.0 / denom.norm_sqr()
                })
                .collect()
        };
        let bsq = [bsq_axis(grid[0]), bsq_axis(grid[1]), bsq_axis(grid[2])];

        let volume = box_len.x * box_len.y * box_len.z;
        let two_pi = 2.0 * std::f64::consts::PI;
        let mut influence = vec![0.0; grid[0] * grid[1] * grid[2]];
        for (mx, my, mz) in iproduct!(0..grid[0], 0..grid[1], 0..grid[2]) {
            if mx == 0 && my == 0 && mz == 0 {
                continue;
            }
            let fold = |m: usize, k: usize| -> f64 {
                if m <= k / 2 {
                    m as f64
                } else {
                    m as f64 - k as f64
                }
            };
            let kx = two_pi * fold(mx, grid[0]) / box_len.x;
            let ky = two_pi * fold(my, grid[1]) / box_len.y;
            let kz = two_pi * fold(mz, grid[2]) / box_len.z;
            let k2 = kx * kx + ky * ky + kz * kz;
            let g = (two_pi / volume) * (-k2 / (4.0 * alpha * alpha)).exp() / k2
                * bsq[0][mx]
                * bsq[1][my]
                * bsq[2][mz];
            influence[(mx * grid[1] + my) * grid[2] + mz] = 2.0 * g;
        }

        Self {
            alpha,
            grid,
            box_len,
            influence,
            forward,
            inverse,
        }
    }

    #[inline]
    fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (ix * self.grid[1] + iy) * self.grid[2] + iz
    }

    /// Per-axis spline data of one particle: grid base indices and scaled
    /// derivative ladders.
    fn splines(&self, position: &Point) -> ([Vec<usize>; 3], [[[f64; PME_ORDER]; 5]; 3]) {
        let mut points: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        let mut ladders = [[[0.0; PME_ORDER]; 5]; 3];
        for axis in 0..3 {
            let k = self.grid[axis];
            let scale = k as f64 / self.box_len[axis];
            let u = (position[axis] * scale).rem_euclid(k as f64);
            let base = u.floor();
            let w = u - base;
            let mut ladder = bspline_ladder(w);
            // chain rule u = x·K/L applied per derivative order
            let mut factor = 1.0;
            for row in ladder.iter_mut() {
                for v in row.iter_mut() {
                    *v *= factor;
                }
                factor *= scale;
            }
            ladders[axis] = ladder;
            let base = base as isize;
            points[axis] = (0..PME_ORDER)
                .map(|m| (base - m as isize).rem_euclid(k as isize) as usize)
                .collect();
        }
        (points, ladders)
    }

    /// Spread moment densities onto a fresh grid.
    ///
    /// The density of a site is
    /// `[q + μ·∇ + (1/3)Θ:∇∇ + (1/15)Ω:∇∇∇]` applied to the spline
    /// product with respect to the particle position.
    pub fn spread(&self, positions: &[Point], moments: &[Moments]) -> Vec<Complex<f64>> {
        let mut grid = vec![Complex::new(0.0, 0.0); self.grid[0] * self.grid[1] * self.grid[2]];
        for (pos, m) in positions.iter().zip(moments.iter()) {
            let (points, t) = self.splines(pos);
            for (jx, jy, jz) in iproduct!(0..PME_ORDER, 0..PME_ORDER, 0..PME_ORDER) {
                // products of per-axis spline derivatives by power triple
                let prod = |px: usize, py: usize, pz: usize| -> f64 {
                    t[0][px][jx] * t[1][py][jy] * t[2][pz][jz]
                };
                let mut coeff = m.q * prod(0, 0, 0);
                coeff += m.d.x * prod(1, 0, 0) + m.d.y * prod(0, 1, 0) + m.d.z * prod(0, 0, 1);
                if !m.quad.is_zero() {
                    let mut sum = 0.0;
                    for (n, &(a, b)) in SYM2_INDICES.iter().enumerate() {
                        let mut p = [0usize; 3];
                        p[a] += 1;
                        p[b] += 1;
                        sum += m.quad.0[n] * SYM2_MULT[n] * prod(p[0], p[1], p[2]);
                    }
                    coeff += sum / 3.0;
                }
                if !m.oct.is_zero() {
                    let mut sum = 0.0;
                    for (n, &(a, b, c)) in SYM3_INDICES.iter().enumerate() {
                        let mut p = [0usize; 3];
                        p[a] += 1;
                        p[b] += 1;
                        p[c] += 1;
                        sum += m.oct.0[n] * SYM3_MULT[n] * prod(p[0], p[1], p[2]);
                    }
                    coeff += sum / 15.0;
                }
                grid[self.index(points[0][jx], points[1][jy], points[2][jz])].re += coeff;
            }
        }
        grid
    }

    fn fft3(&self, data: &mut [Complex<f64>], inverse: bool) {
        let [kx, ky, kz] = self.grid;
        let plans = if inverse { &self.inverse } else { &self.forward };
        // z lines are contiguous
        for chunk in data.chunks_exact_mut(kz) {
            plans[2].process(chunk);
        }
        // y lines
        let mut scratch = vec![Complex::new(0.0, 0.0); ky.max(kx)];
        for ix in 0..kx {
            for iz in 0..kz {
                for iy in 0..ky {
                    scratch[iy] = data[self.index(ix, iy, iz)];
                }
                plans[1].process(&mut scratch[..ky]);
                for iy in 0..ky {
                    data[self.index(ix, iy, iz)] = scratch[iy];
                }
            }
        }
        // x lines
        for iy in 0..ky {
            for iz in 0..kz {
                for ix in 0..kx {
                    scratch[ix] = data[self.index(ix, iy, iz)];
                }
                plans[0].process(&mut scratch[..kx]);
                for ix in 0..kx {
                    data[self.index(ix, iy, iz)] = scratch[ix];
                }
            }
        }
    }

    /// Convolve a density grid into the reciprocal-space potential grid.
    pub fn convolve(&self, grid: &mut [Complex<f64>]) {
        self.fft3(grid, false);
        for (value, g) in grid.iter_mut().zip(self.influence.iter()) {
            *value *= *g;
        }
        self.fft3(grid, true);
    }

    /// Interpolate the potential ladder at one site. `with_rank4` extends
    /// the ladder to the fourth derivative needed for octupole forces.
    pub fn probe(&self, grid: &[Complex<f64>], position: &Point, with_rank4: bool) -> SitePotential {
        let (points, t) = self.splines(position);
        let mut out = SitePotential::default();
        for (jx, jy, jz) in iproduct!(0..PME_ORDER, 0..PME_ORDER, 0..PME_ORDER) {
            let phi = grid[self.index(points[0][jx], points[1][jy], points[2][jz])].re;
            let prod = |px: usize, py: usize, pz: usize| -> f64 {
                t[0][px][jx] * t[1][py][jy] * t[2][pz][jz]
            };
            out.phi += phi * prod(0, 0, 0);
            out.d1.x += phi * prod(1, 0, 0);
            out.d1.y += phi * prod(0, 1, 0);
            out.d1.z += phi * prod(0, 0, 1);
            for (n, &(a, b)) in SYM2_INDICES.iter().enumerate() {
                let mut p = [0usize; 3];
                p[a] += 1;
                p[b] += 1;
                out.d2.0[n] += phi * prod(p[0], p[1], p[2]);
            }
            for (n, &(a, b, c)) in SYM3_INDICES.iter().enumerate() {
                let mut p = [0usize; 3];
                p[a] += 1;
                p[b] += 1;
                p[c] += 1;
                out.d3.0[n] += phi * prod(p[0], p[1], p[2]);
            }
            if with_rank4 {
                for (n, &(a, b, c, d)) in SYM4_INDICES.iter().enumerate() {
                    let mut p = [0usize; 3];
                    p[a] += 1;
                    p[b] += 1;
                    p[c] += 1;
                    p[d] += 1;
                    out.d4.0[n] += phi * prod(p[0], p[1], p[2]);
                }
            }
        }
        out
    }

    /// Ewald self energy of a moment set (to subtract from the reciprocal
    /// sum). From the r → 0 limits of the complementary ladder:
    /// `−½ Σ_l P_l² l! B_l(0) (M_l : M_l)`.
    pub fn self_energy(&self, moments: &[Moments]) -> f64 {
        let b = crate::kernels::erf_self(self.alpha);
        let mut sum = 0.0;
        for m in moments {
            sum += b[0] * m.q * m.q;
            sum += b[1] * m.d.norm_squared();
            sum += b[2] * (2.0 / 9.0) * m.quad.full_dot(&m.quad);
            sum += b[3] * (6.0 / 225.0) * m.oct.full_dot(&m.oct);
        }
        -0.5 * sum
    }

    /// Prefactor of the dipole self field `(4α³)/(3√π)` removed from
    /// interpolated fields.
    pub fn self_field_factor(&self) -> f64 {
        4.0 * self.alpha.powi(3) / (3.0 * SQRT_PI)
    }

    /// Neutralizing-background correction for systems with net charge.
    pub fn background_energy(&self, moments: &[Moments]) -> f64 {
        let total: f64 = moments.iter().map(|m| m.q).sum();
        let volume = self.box_len.x * self.box_len.y * self.box_len.z;
        -std::f64::consts::PI * total * total / (2.0 * volume * self.alpha * self.alpha)
    }
}
