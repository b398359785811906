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

//! Induced-dipole solvers.
//!
//! All three polarization policies iterate the same fixed-point map
//! `μ ← α(E_perm + T·μ)` where `T` is the (damped, group-excluded) dipole
//! field propagator supplied by the caller:
//!
//! * **Direct** stops at order zero, `μ = α·E_perm`.
//! * **Mutual** runs a Jacobi iteration on a frozen snapshot of the
//!   previous dipoles until the rms change drops below the target epsilon,
//!   failing hard at a bounded iteration ceiling.
//! * **Extrapolated** computes a fixed number of perturbation orders of
//!   the map and combines them with fixed coefficients, approximating the
//!   mutual fixed point at bounded, deterministic cost.
//!
//! The solver also reports which induced-dipole pairs (and weights) enter
//! the induced-induced force terms, so that the force assembly is a plain
//! table walk per policy.

use crate::{Error, Matrix3, Point};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Polarization policy selecting how induced dipoles respond to the field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarization {
    /// Single response to the permanent field.
    #[default]
    Direct,
    /// Self-consistent (Jacobi-iterated) response.
    Mutual,
    /// Fixed-order perturbative extrapolation of the mutual response.
    Extrapolated,
}

/// Coefficients combining perturbation orders 0..3 in the extrapolated
/// policy (the OPT3 scheme of Simmonett et al., doi:10.1063/1.4964866).
pub const EXTRAPOLATION_COEFFICIENTS: [f64; 4] = [-0.154, 0.017, 0.657, 0.475];

/// Hard ceiling on Jacobi sweeps before a convergence failure is raised.
pub const MAX_MUTUAL_ITERATIONS: usize = 100;

/// Outcome of an induction solve.
#[derive(Clone, Debug, Default)]
pub struct InducedDipoles {
    /// Policy dipoles entering the polarization energy and the
    /// induced-permanent force terms.
    pub effective: Vec<Point>,
    /// Stored dipole sets (a single set for Direct/Mutual, the
    /// perturbation orders for Extrapolated).
    pub orders: Vec<Vec<Point>>,
    /// `(left order, right order, weight)` table of induced-induced force
    /// terms. For each unordered site pair both orientations of each entry
    /// are accumulated.
    pub cross_terms: Vec<(usize, usize, f64)>,
}

fn apply_alpha(alpha: &[Matrix3], field: &[Point]) -> Vec<Point> {
    alpha.iter().zip(field.iter()).map(|(a, e)| a * e).collect()
}

/// Solve for induced dipoles.
///
/// `induced_field` must return the bare field `T·μ` at every site for a
/// given dipole set, honouring Thole damping and polarization-group
/// exclusions; it is only invoked for the policies that need it.
pub fn solve(
    policy: Polarization,
    alpha: &[Matrix3],
    e_perm: &[Point],
    epsilon: f64,
    induced_field: &mut dyn FnMut(&[Point]) -> Vec<Point>,
) -> Result<InducedDipoles, Error> {
    let n = alpha.len();
    let polarizable = alpha.iter().any(|a| a.norm() != 0.0);
    let mu0 = apply_alpha(alpha, e_perm);
    if !polarizable {
        return Ok(InducedDipoles {
            effective: vec![Point::zeros(); n],
            orders: vec![vec![Point::zeros(); n]],
            cross_terms: Vec::new(),
        });
    }

    match policy {
        Polarization::Direct => Ok(InducedDipoles {
            effective: mu0.clone(),
            orders: vec![mu0],
            cross_terms: Vec::new(),
        }),
        Polarization::Mutual => {
            let mut mu = mu0;
            let mut rms = f64::INFINITY;
            for iteration in 1..=MAX_MUTUAL_ITERATIONS {
                // Jacobi: the update reads only the frozen previous set
                let field = induced_field(&mu);
                let mu_next: Vec<Point> = alpha
                    .iter()
                    .zip(e_perm.iter().zip(field.iter()))
                    .map(|(a, (e0, ei))| a * (e0 + ei))
                    .collect();
                rms = (mu_next
                    .iter()
                    .zip(mu.iter())
                    .map(|(a, b)| (a - b).norm_squared())
                    .sum::<f64>()
                    / n as f64)
                    .sqrt();
                trace!("mutual induction sweep {iteration}: rms change {rms:.3e}");
                mu = mu_next;
                if rms < epsilon {
                    debug!("mutual induction converged after {iteration} sweeps (rms {rms:.3e})");
                    return Ok(InducedDipoles {
                        effective: mu.clone(),
                        orders: vec![mu],
                        cross_terms: vec![(0, 0, 0.5)],
                    });
                }
            }
            Err(Error::Convergence {
                iterations: MAX_MUTUAL_ITERATIONS,
                rms,
            })
        }
        Polarization::Extrapolated => {
            let coeffs = EXTRAPOLATION_COEFFICIENTS;
            let mut orders = vec![mu0];
            for _ in 1..coeffs.len() {
                let field = induced_field(orders.last().expect("non-empty"));
                orders.push(apply_alpha(alpha, &field));
            }
            let mut effective = vec![Point::zeros(); n];
            for (c, order) in coeffs.iter().zip(orders.iter()) {
                for (e, mu) in effective.iter_mut().zip(order.iter()) {
                    *e += mu * *c;
                }
            }
            // induced-induced force terms carry coefficient c_{m+n+1}
            let mut cross_terms = Vec::new();
            for m in 0..coeffs.len() {
                for nn in 0..coeffs.len() {
                    if m + nn + 1 < coeffs.len() {
                        cross_terms.push((m, nn, 0.5 * coeffs[m + nn + 1]));
                    }
                }
            }
            Ok(InducedDipoles {
                effective,
                orders,
                cross_terms,
            })
        }
    }
}
