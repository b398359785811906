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

//! Per-particle multipole parameters and covalent relation tables.
//!
//! Everything in this module is plain immutable setup data: the moments a
//! particle carries in its local frame, how that frame is anchored to
//! neighbouring particles, and which particles are covalently related.

use crate::tensor::{Symmetric2, Symmetric3};
use crate::{Error, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rule for constructing a particle's local coordinate frame from bonded
/// anchor particles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisType {
    /// No frame; moments are interpreted in the global frame.
    #[default]
    NoAxisType,
    /// z along the bond to the z anchor; x is an arbitrary but
    /// deterministic perpendicular.
    ZOnly,
    /// z along the bond to the z anchor, x orthogonalized from the bond to
    /// the x anchor.
    ZThenX,
    /// z along the bisector of the bonds to the z and x anchors, x
    /// orthogonalized from the bond to the x anchor.
    Bisector,
}

impl AxisType {
    /// Anchors that must be present for this frame type.
    pub fn required_anchors(&self) -> &'static [&'static str] {
        match self {
            AxisType::NoAxisType => &[],
            AxisType::ZOnly => &["z"],
            AxisType::ZThenX | AxisType::Bisector => &["z", "x"],
        }
    }
}

/// Covalent relation classes understood by the scaling resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovalentKind {
    /// Directly bonded pair.
    Covalent12,
    /// Bonded-graph distance two.
    Covalent13,
    /// Bonded-graph distance three.
    Covalent14,
    /// Shared polarization group; members never induce each other.
    PolarizationCovalent11,
}

/// Definition of one particle's electrostatic parameters.
///
/// Moments are given in the particle's local frame: dipole in e·nm,
/// traceless quadrupole as `XX XY YY XZ YZ ZZ` in e·nm², traceless
/// octupole as its ten unique components in e·nm³ (see [`crate::tensor`]
/// for the exact ordering). The polarizability holds the three principal
/// values (nm³) along the local axes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultipoleDef {
    pub charge: f64,
    pub dipole: Point,
    pub quadrupole: Symmetric2,
    pub octupole: Symmetric3,
    pub axis: AxisType,
    /// z, x and y anchor particle indices; `None` when absent.
    pub anchor_z: Option<usize>,
    pub anchor_x: Option<usize>,
    pub anchor_y: Option<usize>,
    /// Thole damping width of this particle.
    pub thole: f64,
    /// Principal polarizability values along the local axes.
    pub polarizability: Point,
}

impl MultipoleDef {
    /// A bare point charge with no frame and no polarizability.
    pub fn from_charge(charge: f64) -> Self {
        Self {
            charge,
            ..Default::default()
        }
    }

    /// Mean (isotropic) polarizability, used for the Thole damping radius.
    pub fn mean_polarizability(&self) -> f64 {
        (self.polarizability.x + self.polarizability.y + self.polarizability.z) / 3.0
    }

    pub fn is_polarizable(&self) -> bool {
        self.mean_polarizability() != 0.0
    }

    fn all_values(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.charge)
            .chain(self.dipole.iter().copied())
            .chain(self.quadrupole.0)
            .chain(self.octupole.0)
            .chain(std::iter::once(self.thole))
            .chain(self.polarizability.iter().copied())
    }

    pub(crate) fn validate(&self, index: usize, num_particles: usize) -> Result<(), Error> {
        if self.all_values().any(|v| !v.is_finite()) {
            return Err(Error::config(format!(
                "particle {index} has non-finite multipole parameters"
            )));
        }
        if self.polarizability.iter().any(|&a| a < 0.0) {
            return Err(Error::config(format!(
                "particle {index} has a negative polarizability"
            )));
        }
        let mut seen = BTreeSet::new();
        for (name, anchor) in [
            ("z", self.anchor_z),
            ("x", self.anchor_x),
            ("y", self.anchor_y),
        ] {
            if let Some(a) = anchor {
                if a >= num_particles {
                    return Err(Error::config(format!(
                        "particle {index}: {name} anchor {a} is out of range"
                    )));
                }
                if a == index || !seen.insert(a) {
                    return Err(Error::config(format!(
                        "particle {index}: frame anchors must be distinct particles"
                    )));
                }
            }
        }
        for name in self.axis.required_anchors() {
            let present = match *name {
                "z" => self.anchor_z.is_some(),
                _ => self.anchor_x.is_some(),
            };
            if !present {
                return Err(Error::config(format!(
                    "particle {index}: axis type {:?} requires a {name} anchor",
                    self.axis
                )));
            }
        }
        Ok(())
    }
}

/// Covalent relations of the whole system, one partner set per particle
/// and relation kind.
#[derive(Clone, Debug, Default)]
pub struct CovalentMaps {
    pub cov12: Vec<BTreeSet<usize>>,
    pub cov13: Vec<BTreeSet<usize>>,
    pub cov14: Vec<BTreeSet<usize>>,
    pub polarization11: Vec<BTreeSet<usize>>,
}

impl CovalentMaps {
    pub fn new(num_particles: usize) -> Self {
        Self {
            cov12: vec![BTreeSet::new(); num_particles],
            cov13: vec![BTreeSet::new(); num_particles],
            cov14: vec![BTreeSet::new(); num_particles],
            polarization11: vec![BTreeSet::new(); num_particles],
        }
    }

    pub fn set(&mut self, particle: usize, kind: CovalentKind, partners: &[usize]) {
        let set: BTreeSet<usize> = partners.iter().copied().collect();
        match kind {
            CovalentKind::Covalent12 => self.cov12[particle] = set,
            CovalentKind::Covalent13 => self.cov13[particle] = set,
            CovalentKind::Covalent14 => self.cov14[particle] = set,
            CovalentKind::PolarizationCovalent11 => {
                // Force fields commonly list a particle inside its own
                // polarization group; self membership carries no
                // information, so strip it.
                let mut set = set;
                set.remove(&particle);
                self.polarization11[particle] = set;
            }
        }
    }

    pub(crate) fn validate(&self, num_particles: usize) -> Result<(), Error> {
        let check = |maps: &Vec<BTreeSet<usize>>, name: &str, allow_self: bool| {
            for (i, partners) in maps.iter().enumerate() {
                for &j in partners {
                    if j >= num_particles {
                        return Err(Error::config(format!(
                            "{name} map of particle {i} references particle {j}, out of range"
                        )));
                    }
                    if j == i && !allow_self {
                        return Err(Error::config(format!(
                            "{name} map of particle {i} references itself"
                        )));
                    }
                    if !maps[j].contains(&i) {
                        return Err(Error::config(format!(
                            "{name} map is not symmetric for pair ({i}, {j})"
                        )));
                    }
                }
            }
            Ok(())
        };
        check(&self.cov12, "Covalent12", false)?;
        check(&self.cov13, "Covalent13", false)?;
        check(&self.cov14, "Covalent14", false)?;
        check(&self.polarization11, "PolarizationCovalent11", false)?;
        Ok(())
    }
}
