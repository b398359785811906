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

//! Local coordinate frames and torque redistribution.
//!
//! Each particle's moments are defined in a local frame anchored to bonded
//! neighbours. This module builds the local→global rotation for every axis
//! type, rotates moments and polarizabilities into the lab frame, and maps
//! the torque a multipole experiences back onto forces on the anchor
//! particles (the frame is rigidly attached to the anchor directions, so a
//! torque is equivalent to forces on the anchors).

use crate::params::{AxisType, MultipoleDef};
use crate::tensor::{Symmetric2, Symmetric3};
use crate::{Error, Matrix3, Point};

/// Threshold for |z·x̂_global| above which the global y axis seeds the
/// arbitrary perpendicular of a `ZOnly` frame.
const Z_ONLY_SWITCH: f64 = 0.866;

/// Degenerate-geometry guard on sines of frame angles.
const MIN_SINE: f64 = 1e-8;

/// Local→global rotation for one particle. Columns are the global
/// directions of the local x, y and z axes.
pub fn build_rotation(
    index: usize,
    def: &MultipoleDef,
    positions: &[Point],
) -> Result<Matrix3, Error> {
    let pos = positions[index];
    let unit_to = |anchor: usize| -> Result<Point, Error> {
        let d: Point = positions[anchor] - pos;
        let norm = d.norm();
        if norm < 1e-10 {
            return Err(Error::NumericalDomain {
                i: index,
                j: anchor,
                distance: norm,
            });
        }
        Ok(d / norm)
    };

    let (z, x_seed) = match def.axis {
        AxisType::NoAxisType => return Ok(Matrix3::identity()),
        AxisType::ZOnly => {
            let z = unit_to(def.anchor_z.expect("validated"))?;
            let seed = if z.x.abs() < Z_ONLY_SWITCH {
                Point::new(1.0, 0.0, 0.0)
            } else {
                Point::new(0.0, 1.0, 0.0)
            };
            (z, seed)
        }
        AxisType::ZThenX => {
            let z = unit_to(def.anchor_z.expect("validated"))?;
            let v = unit_to(def.anchor_x.expect("validated"))?;
            (z, v)
        }
        AxisType::Bisector => {
            let u = unit_to(def.anchor_z.expect("validated"))?;
            let v = unit_to(def.anchor_x.expect("validated"))?;
            let b = u + v;
            let norm = b.norm();
            if norm < MIN_SINE {
                return Err(Error::config(format!(
                    "particle {index}: bisector anchors are antiparallel"
                )));
            }
            (b / norm, v)
        }
    };

    let x_raw = x_seed - z * x_seed.dot(&z);
    let sine = x_raw.norm();
    if sine < MIN_SINE {
        return Err(Error::config(format!(
            "particle {index}: frame anchors are collinear"
        )));
    }
    let x = x_raw / sine;
    let y = z.cross(&x);
    Ok(Matrix3::from_columns(&[x, y, z]))
}

/// Whether the y anchor makes the frame left-handed, in which case the
/// y-odd local components are negated before rotation.
pub fn is_inverted(index: usize, def: &MultipoleDef, positions: &[Point]) -> bool {
    if def.axis != AxisType::ZThenX {
        return false;
    }
    let (Some(ay), Some(az), Some(ax)) = (def.anchor_y, def.anchor_z, def.anchor_x) else {
        return false;
    };
    let ad = positions[index] - positions[ay];
    let bd = positions[az] - positions[ay];
    let cd = positions[ax] - positions[ay];
    bd.cross(&cd).dot(&ad) < 0.0
}

/// Rotate a particle's local moments into the global frame.
pub fn lab_moments(
    def: &MultipoleDef,
    rotation: &Matrix3,
    inverted: bool,
) -> (Point, Symmetric2, Symmetric3) {
    let mut dipole = def.dipole;
    let mut quad = def.quadrupole;
    let mut oct = def.octupole;
    if inverted {
        dipole.y = -dipole.y;
        quad.0[1] = -quad.0[1]; // XY
        quad.0[4] = -quad.0[4]; // YZ
        oct.0[1] = -oct.0[1]; // XXY
        oct.0[3] = -oct.0[3]; // YYY
        oct.0[5] = -oct.0[5]; // XYZ
        oct.0[8] = -oct.0[8]; // YZZ
    }
    (
        rotation * dipole,
        quad.rotate(rotation),
        oct.rotate(rotation),
    )
}

/// The lab-frame polarizability tensor `R·diag(α)·Rᵀ`.
pub fn lab_polarizability(def: &MultipoleDef, rotation: &Matrix3) -> Matrix3 {
    let d = Matrix3::from_diagonal(&def.polarizability);
    rotation * d * rotation.transpose()
}

/// Distribute a torque on particle `index` onto forces on its frame
/// anchors (and the reaction on the particle itself).
///
/// The formulas are the closed-form response of each frame construction to
/// anchor displacements; the energy change of an infinitesimal frame
/// rotation δθ is −τ·δθ, so forces are τ contracted with ∂θ/∂(anchor
/// position).
pub fn map_torque_to_forces(
    index: usize,
    def: &MultipoleDef,
    positions: &[Point],
    torque: &Point,
    forces: &mut [Point],
) {
    if def.axis == AxisType::NoAxisType {
        // global-frame moments never rotate; the torque has no position
        // dependence to map
        return;
    }
    let pos = positions[index];
    let anchor_z = def.anchor_z.expect("validated");
    let u: Point = positions[anchor_z] - pos;
    let u_norm = u.norm();
    let u_hat = u / u_norm;

    match def.axis {
        AxisType::NoAxisType => unreachable!(),
        AxisType::ZOnly => {
            let z = u_hat;
            let seed = if z.x.abs() < Z_ONLY_SWITCH {
                Point::new(1.0, 0.0, 0.0)
            } else {
                Point::new(0.0, 1.0, 0.0)
            };
            let x_raw = seed - z * seed.dot(&z);
            let sine = x_raw.norm();
            if sine < MIN_SINE {
                return;
            }
            let x = x_raw / sine;
            let y = z.cross(&x);
            let (tx, ty, tz) = (torque.dot(&x), torque.dot(&y), torque.dot(&z));
            let cos = seed.dot(&z);
            let f_z: Point = (x * ty - y * (tx + tz * cos / sine)) / u_norm;
            forces[anchor_z] += f_z;
            forces[index] -= f_z;
        }
        AxisType::ZThenX => {
            let anchor_x = def.anchor_x.expect("validated");
            let v: Point = positions[anchor_x] - pos;
            let v_norm = v.norm();
            let v_hat = v / v_norm;
            let z = u_hat;
            let cos = z.dot(&v_hat);
            let sine = (1.0 - cos * cos).max(0.0).sqrt();
            if sine < MIN_SINE {
                return;
            }
            let x = (v_hat - z * cos) / sine;
            let y = z.cross(&x);
            let (tx, ty, tz) = (torque.dot(&x), torque.dot(&y), torque.dot(&z));
            let f_z: Point = (x * ty - y * (tx + tz * cos / sine)) / u_norm;
            let f_x: Point = y * (tz / (v_norm * sine));
            forces[anchor_z] += f_z;
            forces[anchor_x] += f_x;
            forces[index] -= f_z + f_x;
        }
        AxisType::Bisector => {
            let anchor_x = def.anchor_x.expect("validated");
            let v: Point = positions[anchor_x] - pos;
            let v_norm = v.norm();
            let v_hat = v / v_norm;
            let b = u_hat + v_hat;
            let b_norm = b.norm();
            if b_norm < MIN_SINE {
                return;
            }
            let z = b / b_norm;
            let cos_h = v_hat.dot(&z); // cosine of the half angle
            let sin_h = (1.0 - cos_h * cos_h).max(0.0).sqrt();
            if sin_h < MIN_SINE || cos_h < MIN_SINE {
                return;
            }
            let x = (v_hat - z * cos_h) / sin_h;
            let y = z.cross(&x);
            let (tx, ty, tz) = (torque.dot(&x), torque.dot(&y), torque.dot(&z));
            let f_z: Point = (-y * (tx / (2.0 * cos_h)) - y * (tz / (2.0 * sin_h))
                + (x * cos_h + z * sin_h) * (ty / 2.0))
                / u_norm;
            let f_x: Point = (-y * (tx / (2.0 * cos_h)) + y * (tz / (2.0 * sin_h))
                + (x * cos_h - z * sin_h) * (ty / 2.0))
                / v_norm;
            forces[anchor_z] += f_z;
            forces[anchor_x] += f_x;
            forces[index] -= f_z + f_x;
        }
    }
}
