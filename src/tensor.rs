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

//! Small fixed-size symmetric Cartesian tensors.
//!
//! Multipole moments and potential derivatives are symmetric tensors of
//! rank 0..4 with at most 15 independent components, so each rank gets its
//! own value type with explicit contraction operations instead of a
//! dynamically sized abstraction. Component order follows the unique
//! lower-index convention:
//!
//! * rank 2: `XX XY YY XZ YZ ZZ`
//! * rank 3: `XXX XXY XYY YYY XXZ XYZ YYZ XZZ YZZ ZZZ`
//! * rank 4: `XXXX XXXY XXYY XYYY YYYY XXXZ XXYZ XYYZ YYYZ XXZZ XYZZ YYZZ XZZZ YZZZ ZZZZ`

use crate::{Matrix3, Point};
use serde::{Deserialize, Serialize};

/// Index pairs of the six unique rank-2 components.
pub const SYM2_INDICES: [(usize, usize); 6] = [(0, 0), (0, 1), (1, 1), (0, 2), (1, 2), (2, 2)];
/// Permutation multiplicity of each rank-2 component.
pub const SYM2_MULT: [f64; 6] = [1.0, 2.0, 1.0, 2.0, 2.0, 1.0];

/// Index triples of the ten unique rank-3 components.
pub const SYM3_INDICES: [(usize, usize, usize); 10] = [
    (0, 0, 0),
    (0, 0, 1),
    (0, 1, 1),
    (1, 1, 1),
    (0, 0, 2),
    (0, 1, 2),
    (1, 1, 2),
    (0, 2, 2),
    (1, 2, 2),
    (2, 2, 2),
];
/// Permutation multiplicity of each rank-3 component.
pub const SYM3_MULT: [f64; 10] = [1.0, 3.0, 3.0, 1.0, 3.0, 6.0, 3.0, 3.0, 3.0, 1.0];

/// Index quadruples of the fifteen unique rank-4 components.
pub const SYM4_INDICES: [(usize, usize, usize, usize); 15] = [
    (0, 0, 0, 0),
    (0, 0, 0, 1),
    (0, 0, 1, 1),
    (0, 1, 1, 1),
    (1, 1, 1, 1),
    (0, 0, 0, 2),
    (0, 0, 1, 2),
    (0, 1, 1, 2),
    (1, 1, 1, 2),
    (0, 0, 2, 2),
    (0, 1, 2, 2),
    (1, 1, 2, 2),
    (0, 2, 2, 2),
    (1, 2, 2, 2),
    (2, 2, 2, 2),
];

const fn idx2(i: usize, j: usize) -> usize {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    // offsets of the sorted pairs in SYM2_INDICES
    match (lo, hi) {
        (0, 0) => 0,
        (0, 1) => 1,
        (1, 1) => 2,
        (0, 2) => 3,
        (1, 2) => 4,
        _ => 5,
    }
}

fn idx3(i: usize, j: usize, k: usize) -> usize {
    let mut v = [i, j, k];
    v.sort_unstable();
    match (v[0], v[1], v[2]) {
        (0, 0, 0) => 0,
        (0, 0, 1) => 1,
        (0, 1, 1) => 2,
        (1, 1, 1) => 3,
        (0, 0, 2) => 4,
        (0, 1, 2) => 5,
        (1, 1, 2) => 6,
        (0, 2, 2) => 7,
        (1, 2, 2) => 8,
        _ => 9,
    }
}

fn idx4(i: usize, j: usize, k: usize, l: usize) -> usize {
    let mut v = [i, j, k, l];
    v.sort_unstable();
    match (v[0], v[1], v[2], v[3]) {
        (0, 0, 0, 0) => 0,
        (0, 0, 0, 1) => 1,
        (0, 0, 1, 1) => 2,
        (0, 1, 1, 1) => 3,
        (1, 1, 1, 1) => 4,
        (0, 0, 0, 2) => 5,
        (0, 0, 1, 2) => 6,
        (0, 1, 1, 2) => 7,
        (1, 1, 1, 2) => 8,
        (0, 0, 2, 2) => 9,
        (0, 1, 2, 2) => 10,
        (1, 1, 2, 2) => 11,
        (0, 2, 2, 2) => 12,
        (1, 2, 2, 2) => 13,
        _ => 14,
    }
}

/// Symmetric rank-2 tensor (e.g. a traceless quadrupole moment).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Symmetric2(pub [f64; 6]);

impl Symmetric2 {
    pub fn zeros() -> Self {
        Self([0.0; 6])
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[idx2(i, j)]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }

    /// Contraction with a vector over one slot: `(Q·r)_a = Σ_b Q_ab r_b`.
    pub fn dot_vec(&self, r: &Point) -> Point {
        let [xx, xy, yy, xz, yz, zz] = self.0;
        Point::new(
            xx * r.x + xy * r.y + xz * r.z,
            xy * r.x + yy * r.y + yz * r.z,
            xz * r.x + yz * r.y + zz * r.z,
        )
    }

    /// Quadratic form `r·Q·r`.
    pub fn quad_form(&self, r: &Point) -> f64 {
        self.dot_vec(r).dot(r)
    }

    /// Full contraction `Q:S = Σ_ab Q_ab S_ab`.
    pub fn full_dot(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .zip(SYM2_MULT.iter())
            .map(|((a, b), m)| a * b * m)
            .sum()
    }

    /// General (non-symmetric) matrix product `Q·S`.
    pub fn matmul(&self, other: &Self) -> Matrix3 {
        self.as_matrix() * other.as_matrix()
    }

    pub fn as_matrix(&self) -> Matrix3 {
        let [xx, xy, yy, xz, yz, zz] = self.0;
        Matrix3::new(xx, xy, xz, xy, yy, yz, xz, yz, zz)
    }

    pub fn from_matrix(m: &Matrix3) -> Self {
        Self([
            m[(0, 0)],
            0.5 * (m[(0, 1)] + m[(1, 0)]),
            m[(1, 1)],
            0.5 * (m[(0, 2)] + m[(2, 0)]),
            0.5 * (m[(1, 2)] + m[(2, 1)]),
            m[(2, 2)],
        ])
    }

    /// Similarity transform `R·Q·Rᵀ` into the frame described by `rot`.
    pub fn rotate(&self, rot: &Matrix3) -> Self {
        Self::from_matrix(&(rot * self.as_matrix() * rot.transpose()))
    }

    pub fn scaled(&self, s: f64) -> Self {
        let mut out = *self;
        out.0.iter_mut().for_each(|c| *c *= s);
        out
    }

    pub fn add_assign_scaled(&mut self, other: &Self, s: f64) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += b * s;
        }
    }
}

/// Symmetric rank-3 tensor (e.g. a traceless octupole moment).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Symmetric3(pub [f64; 10]);

impl Symmetric3 {
    pub fn zeros() -> Self {
        Self([0.0; 10])
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.0[idx3(i, j, k)]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }

    /// Contraction with a vector over one slot: `(O·r)_ab = Σ_c O_abc r_c`.
    pub fn dot_vec(&self, r: &Point) -> Symmetric2 {
        let mut out = [0.0; 6];
        for (n, &(i, j)) in SYM2_INDICES.iter().enumerate() {
            out[n] = self.get(i, j, 0) * r.x + self.get(i, j, 1) * r.y + self.get(i, j, 2) * r.z;
        }
        Symmetric2(out)
    }

    /// Full contraction `O:::P = Σ_abc O_abc P_abc`.
    pub fn full_dot(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .zip(SYM3_MULT.iter())
            .map(|((a, b), m)| a * b * m)
            .sum()
    }

    /// The rank-2 tensor obtained by fixing one slot to `axis`.
    pub fn slice(&self, axis: usize) -> Symmetric2 {
        let mut out = [0.0; 6];
        for (n, &(i, j)) in SYM2_INDICES.iter().enumerate() {
            out[n] = self.get(i, j, axis);
        }
        Symmetric2(out)
    }

    /// Contraction over two slots with a symmetric rank-2 tensor:
    /// `v_c = Σ_ab O_abc S_ab`.
    pub fn contract_sym2(&self, s: &Symmetric2) -> Point {
        Point::new(
            self.slice(0).full_dot(s),
            self.slice(1).full_dot(s),
            self.slice(2).full_dot(s),
        )
    }

    /// The matrix `M_qa = Σ_bc O_qbc P_abc` of slice contractions, used for
    /// torque (rotational gradient) terms.
    pub fn cross_matrix(&self, other: &Self) -> Matrix3 {
        let mut m = Matrix3::zeros();
        for q in 0..3 {
            for a in 0..3 {
                m[(q, a)] = self.slice(q).full_dot(&other.slice(a));
            }
        }
        m
    }

    /// Rotation of all three slots into the frame described by `rot`.
    pub fn rotate(&self, rot: &Matrix3) -> Self {
        let mut out = [0.0; 10];
        for (n, &(a, b, c)) in SYM3_INDICES.iter().enumerate() {
            let mut sum = 0.0;
            for d in 0..3 {
                for e in 0..3 {
                    for f in 0..3 {
                        sum += rot[(a, d)] * rot[(b, e)] * rot[(c, f)] * self.get(d, e, f);
                    }
                }
            }
            out[n] = sum;
        }
        Self(out)
    }

    pub fn scaled(&self, s: f64) -> Self {
        let mut out = *self;
        out.0.iter_mut().for_each(|c| *c *= s);
        out
    }

    pub fn add_assign_scaled(&mut self, other: &Self, s: f64) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += b * s;
        }
    }
}

/// Symmetric rank-4 tensor; only used for the fourth potential derivative
/// when interpolating octupole forces off the reciprocal-space grid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Symmetric4(pub [f64; 15]);

impl Symmetric4 {
    pub fn zeros() -> Self {
        Self([0.0; 15])
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.0[idx4(i, j, k, l)]
    }

    /// The rank-3 tensor obtained by fixing one slot to `axis`.
    pub fn slice(&self, axis: usize) -> Symmetric3 {
        let mut out = [0.0; 10];
        for (n, &(i, j, k)) in SYM3_INDICES.iter().enumerate() {
            out[n] = self.get(i, j, k, axis);
        }
        Symmetric3(out)
    }

    /// Contraction over three slots with a symmetric rank-3 tensor:
    /// `v_a = Σ_bcd T_abcd O_bcd`.
    pub fn contract_sym3(&self, o: &Symmetric3) -> Point {
        Point::new(
            self.slice(0).full_dot(o),
            self.slice(1).full_dot(o),
            self.slice(2).full_dot(o),
        )
    }
}

/// Axial vector of a matrix: `ax(A)_x = A_yz − A_zy` and cyclic. For the
/// product of two symmetric tensors this is the rotational gradient of
/// their full contraction.
pub fn axial(a: &Matrix3) -> Point {
    Point::new(
        a[(1, 2)] - a[(2, 1)],
        a[(2, 0)] - a[(0, 2)],
        a[(0, 1)] - a[(1, 0)],
    )
}
