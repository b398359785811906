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

//! Radial interaction kernels.
//!
//! Every multipole interaction in this crate is assembled from a ladder of
//! radial coefficients `B_n(r)` obeying `B_{n+1} = −B_n′/r`, contracted
//! against geometric moment products. The ladder for the bare Coulomb
//! kernel is `B_n = (2n−1)!!/r^{2n+1}`; the Ewald real-space ladder follows
//! Smith's erfc recursion; Thole damping multiplies ladder entry `n` by a
//! factor `λ_{2n+1}(u)` that itself respects the same derivative rule, so
//! differentiating a damped interaction is again a shift along the ladder.

/// Number of ladder entries carried around; B₀..B₇ covers the octupole ×
/// octupole force.
pub const NB: usize = 8;

const SQRT_PI: f64 = 1.7724538509055159;

/// Bare Coulomb ladder `B_n = (2n−1)!!/r^{2n+1}`.
pub fn plain(r: f64) -> [f64; NB] {
    let r2_inv = 1.0 / (r * r);
    let mut b = [0.0; NB];
    b[0] = 1.0 / r;
    for n in 0..NB - 1 {
        b[n + 1] = (2 * n + 1) as f64 * b[n] * r2_inv;
    }
    b
}

/// Ewald real-space ladder, `B_0 = erfc(αr)/r` continued by Smith's
/// recursion `B_{n+1} = [(2n+1)B_n + (2α²)^{n+1}·e^{−α²r²}/(α√π)]/r²`.
pub fn ewald_real(r: f64, alpha: f64) -> [f64; NB] {
    let ar = alpha * r;
    let r2_inv = 1.0 / (r * r);
    let exp_term = (-ar * ar).exp() / (alpha * SQRT_PI);
    let two_a2 = 2.0 * alpha * alpha;
    let mut b = [0.0; NB];
    b[0] = erfc_x(ar) / r;
    let mut gauss = two_a2 * exp_term;
    for n in 0..NB - 1 {
        b[n + 1] = ((2 * n + 1) as f64 * b[n] + gauss) * r2_inv;
        gauss *= two_a2;
    }
    b
}

/// Small-r limits `B_n(0)` of the complementary (erf) ladder,
/// `(2α/√π)·(2α²)ⁿ/(2n+1)`; these generate the Ewald self interaction.
pub fn erf_self(alpha: f64) -> [f64; NB] {
    let mut b = [0.0; NB];
    let mut pow = 2.0 * alpha / SQRT_PI;
    for (n, entry) in b.iter_mut().enumerate() {
        *entry = pow / (2 * n + 1) as f64;
        pow *= 2.0 * alpha * alpha;
    }
    b
}

/// Thole damping factors `λ_{2n+1}(u)` for ladder entries B₀..B₅, for the
/// exponentially screened charge distribution `ρ ∝ e^{−u}`:
///
/// `λ₁ = 1 − (1 + u/2)e^{−u}`, `λ₃ = 1 − (1 + u + u²/2)e^{−u}`, and each
/// following factor obeys `λ_{2n+3} = λ_{2n+1} − r·λ′_{2n+1}/(2n+1)`.
pub fn thole_factors(u: f64) -> [f64; 6] {
    let e = (-u).exp();
    let u2 = u * u;
    let u3 = u2 * u;
    let u4 = u2 * u2;
    let u5 = u4 * u;
    let u6 = u3 * u3;
    let l1 = 1.0 - (1.0 + 0.5 * u) * e;
    let l3 = 1.0 - (1.0 + u + 0.5 * u2) * e;
    let l5 = l3 - u3 / 6.0 * e;
    let l7 = l5 - u4 / 30.0 * e;
    let l9 = l7 - (u4 + u5) / 210.0 * e;
    let l11 = l9 - (3.0 * u4 + 3.0 * u5 + u6) / 1890.0 * e;
    [l1, l3, l5, l7, l9, l11]
}

/// Damp a bare Coulomb ladder with Thole factors.
pub fn damped(r: f64, u: f64) -> [f64; NB] {
    let mut b = plain(r);
    let lambda = thole_factors(u);
    for (n, l) in lambda.iter().enumerate() {
        b[n] *= l;
    }
    // Entries above B₅ never appear in damped (induced-dipole) sectors.
    b[6] = 0.0;
    b[7] = 0.0;
    b
}

/// Approximation of the complementary error function.
///
/// Abramowitz & Stegun, Handbook of mathematical functions, eq. 7.1.26;
/// absolute error below 1.5·10⁻⁷. Valid for x ≥ 0, which is the only
/// range the Ewald kernels probe.
#[inline]
pub fn erfc_x(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    t * (a1 + t * (a2 + t * (a3 + t * (a4 + t * a5)))) * f64::exp(-x * x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plain_closed_form() {
        let r: f64 = 1.7;
        let b = plain(r);
        assert_relative_eq!(b[0], 1.0 / r);
        assert_relative_eq!(b[1], 1.0 / r.powi(3));
        assert_relative_eq!(b[2], 3.0 / r.powi(5));
        assert_relative_eq!(b[3], 15.0 / r.powi(7));
        assert_relative_eq!(b[4], 105.0 / r.powi(9));
        assert_relative_eq!(b[5], 945.0 / r.powi(11));
    }

    #[test]
    fn erfc_reference_values() {
        assert_relative_eq!(erfc_x(0.0), 1.0, epsilon = 2e-7);
        assert_relative_eq!(erfc_x(0.5), 0.4795001222, epsilon = 2e-6);
        assert_relative_eq!(erfc_x(1.0), 0.1572992070, epsilon = 2e-6);
        assert_relative_eq!(erfc_x(2.0), 0.0046777350, epsilon = 2e-6);
    }

    /// The derivative rule `B_{n+1} = −B_n′/r` is what makes forces a pure
    /// shift along the ladder; verify it numerically for both families.
    #[test]
    fn ladders_obey_derivative_rule() {
        let h = 1e-6;
        for &r in &[0.31, 0.8, 1.9] {
            let plain_hi = plain(r + h);
            let plain_lo = plain(r - h);
            let b = plain(r);
            for n in 0..NB - 1 {
                let deriv = (plain_hi[n] - plain_lo[n]) / (2.0 * h);
                assert_relative_eq!(b[n + 1], -deriv / r, max_relative = 1e-6);
            }
            let alpha = 2.3;
            let ew_hi = ewald_real(r + h, alpha);
            let ew_lo = ewald_real(r - h, alpha);
            let bw = ewald_real(r, alpha);
            for n in 0..NB - 1 {
                let deriv = (ew_hi[n] - ew_lo[n]) / (2.0 * h);
                // erfc_x is itself approximate; its recursion partner is
                // exact to the same tolerance
                assert_relative_eq!(bw[n + 1], -deriv / r, max_relative = 1e-4);
            }
        }
    }

    /// Damped ladder follows the same derivative rule, confirming the λ
    /// recursion used in `thole_factors`.
    #[test]
    fn damped_ladder_obeys_derivative_rule() {
        let h = 1e-6;
        let a = 7.9; // damping exponent per unit length
        for &r in &[0.1, 0.25, 0.6] {
            let hi = damped(r + h, a * (r + h));
            let lo = damped(r - h, a * (r - h));
            let b = damped(r, a * r);
            for n in 0..5 {
                let deriv = (hi[n] - lo[n]) / (2.0 * h);
                assert_relative_eq!(b[n + 1], -deriv / r, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn thole_factors_approach_unity() {
        let l = thole_factors(40.0);
        for f in l {
            assert_relative_eq!(f, 1.0, epsilon = 1e-12);
        }
        // and vanish at contact
        let l0 = thole_factors(0.0);
        for f in l0 {
            assert_relative_eq!(f, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn erf_self_matches_difference_limit() {
        // B_n^plain − B_n^ewald → B_n^self as r → 0
        let alpha = 1.9;
        let r = 1e-3;
        let diff: Vec<f64> = plain(r)
            .iter()
            .zip(ewald_real(r, alpha).iter())
            .map(|(p, e)| p - e)
            .collect();
        let limit = erf_self(alpha);
        for n in 0..4 {
            assert_relative_eq!(diff[n], limit[n], max_relative = 1e-2);
        }
    }
}
