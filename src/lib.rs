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

//! # Polarizable multipole electrostatics
//!
//! This crate evaluates the electrostatic energy and forces of a set of
//! particles carrying permanent multipole moments (charge, dipole,
//! quadrupole, octupole) and anisotropic polarizabilities. Induced dipoles
//! respond to the permanent field under one of three polarization policies
//! ([`Polarization::Direct`], [`Polarization::Mutual`],
//! [`Polarization::Extrapolated`]), with Thole damping taming the
//! short-range response. Periodic systems are summed with particle-mesh
//! Ewald; non-periodic systems with a plain all-pairs sum.
//!
//! Multipole parameters are defined in per-particle local frames anchored
//! to bonded neighbours, so the moments follow molecular rotation. Torques
//! on the rotated moments are redistributed onto the anchor particles,
//! keeping the returned forces the exact negative gradient of the energy.
//!
//! ## Example
//! ~~~
//! use multipolar::{ModelBuilder, MultipoleDef, Point, Selection};
//!
//! let mut builder = ModelBuilder::new();
//! for charge in [1.0, -1.0] {
//!     builder.add_multipole(MultipoleDef::from_charge(charge));
//! }
//! let model = builder.build().unwrap();
//! let positions = [Point::new(0.0, 0.0, 0.0), Point::new(0.3, 0.0, 0.0)];
//! let result = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
//! assert!(result.energy < 0.0); // opposite charges attract
//! ~~~
//!
//! Units follow the convention of the surrounding simulation stack:
//! nanometers, elementary charges and kJ/mol.

/// A point or vector in 3D space
pub type Point = nalgebra::Vector3<f64>;
/// A stack-allocated 3x3 square matrix
pub type Matrix3 = nalgebra::Matrix3<f64>;

mod error;
pub mod frame;
pub mod induction;
pub mod kernels;
pub mod model;
pub mod params;
pub mod pme;
pub mod realspace;
pub mod scaling;
pub mod tensor;
pub mod units;

pub use error::Error;
pub use model::{Evaluation, Model, ModelBuilder, NonbondedMethod, Selection};
pub use params::{AxisType, CovalentKind, MultipoleDef};
pub use induction::Polarization;
