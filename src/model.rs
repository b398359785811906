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

//! Model setup and the evaluation entry point.
//!
//! A [`ModelBuilder`] collects per-particle multipole definitions,
//! covalent maps and method configuration; [`ModelBuilder::build`]
//! validates everything once and produces an immutable [`Model`]. Each
//! call to [`Model::evaluate`] is a self-contained computation from
//! positions to energy (and optionally forces); no state survives between
//! calls.

use crate::frame;
use crate::induction::{self, InducedDipoles, Polarization};
use crate::kernels::{self, NB};
use crate::params::{CovalentKind, CovalentMaps, MultipoleDef};
use crate::pme::Pme;
use crate::realspace::{field_at, multipole_pair, Moments};
use crate::scaling::{ScaleFactors, ScaleTable};
use crate::units::coulomb_factor;
use crate::{Error, Matrix3, Point};
use log::debug;
use serde::{Deserialize, Serialize};

/// Treatment of long-range electrostatics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonbondedMethod {
    /// All pairs, no periodicity.
    #[default]
    NoCutoff,
    /// Particle-mesh Ewald with a real-space cutoff; requires a periodic
    /// box.
    Pme,
}

/// What an evaluation should produce. Forces are strictly more expensive
/// than the energy alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Energy,
    EnergyAndForces,
}

/// Result of one evaluation.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// Potential energy in kJ/mol.
    pub energy: f64,
    /// Per-particle forces in kJ/mol/nm when requested.
    pub forces: Option<Vec<Point>>,
}

/// Separation floor below which interaction tensors are reported as
/// singular rather than evaluated.
const MIN_SEPARATION: f64 = 1e-6;

/// Accumulating builder for a [`Model`].
#[derive(Clone, Debug, Default)]
pub struct ModelBuilder {
    multipoles: Vec<MultipoleDef>,
    covalent: Vec<(usize, CovalentKind, Vec<usize>)>,
    method: NonbondedMethod,
    cutoff: f64,
    pme_alpha: f64,
    pme_grid: [usize; 3],
    polarization: Polarization,
    mutual_epsilon: f64,
    default_thole_width: f64,
    scale14: f64,
    box_raw: Option<[Point; 3]>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            mutual_epsilon: 1e-5,
            default_thole_width: 3.0,
            scale14: 1.0,
            cutoff: 1.0,
            ..Default::default()
        }
    }

    /// Register one particle; returns its index.
    pub fn add_multipole(&mut self, def: MultipoleDef) -> usize {
        self.multipoles.push(def);
        self.multipoles.len() - 1
    }

    /// Set the partner list of one covalent relation kind for a particle.
    pub fn set_covalent_map(
        &mut self,
        particle: usize,
        kind: CovalentKind,
        partners: &[usize],
    ) -> &mut Self {
        self.covalent.push((particle, kind, partners.to_vec()));
        self
    }

    pub fn nonbonded_method(&mut self, method: NonbondedMethod) -> &mut Self {
        self.method = method;
        self
    }

    pub fn cutoff(&mut self, cutoff: f64) -> &mut Self {
        self.cutoff = cutoff;
        self
    }

    /// Ewald coefficient and grid dimensions for PME.
    pub fn pme_parameters(&mut self, alpha: f64, nx: usize, ny: usize, nz: usize) -> &mut Self {
        self.pme_alpha = alpha;
        self.pme_grid = [nx, ny, nz];
        self
    }

    pub fn polarization(&mut self, policy: Polarization) -> &mut Self {
        self.polarization = policy;
        self
    }

    pub fn mutual_epsilon(&mut self, epsilon: f64) -> &mut Self {
        self.mutual_epsilon = epsilon;
        self
    }

    pub fn default_thole_width(&mut self, width: f64) -> &mut Self {
        self.default_thole_width = width;
        self
    }

    pub fn scale_factor_14(&mut self, scale: f64) -> &mut Self {
        self.scale14 = scale;
        self
    }

    /// Periodic box vectors. Only orthorhombic (diagonal) boxes are
    /// supported; absent box means non-periodic.
    pub fn box_vectors(&mut self, a: Point, b: Point, c: Point) -> &mut Self {
        self.box_raw = Some([a, b, c]);
        self
    }

    /// Validate the collected setup and produce an immutable model.
    pub fn build(self) -> Result<Model, Error> {
        let n = self.multipoles.len();
        for (i, def) in self.multipoles.iter().enumerate() {
            def.validate(i, n)?;
        }

        let mut maps = CovalentMaps::new(n);
        for (particle, kind, partners) in &self.covalent {
            if *particle >= n {
                return Err(Error::config(format!(
                    "covalent map for particle {particle} is out of range"
                )));
            }
            maps.set(*particle, *kind, partners);
        }
        maps.validate(n)?;

        let factors = ScaleFactors {
            scale14: self.scale14,
            ..Default::default()
        };
        let scale_table = ScaleTable::build(&maps, &factors);

        let box_lengths = match self.box_raw {
            None => None,
            Some([a, b, c]) => {
                let off_diagonal =
                    a.y != 0.0 || a.z != 0.0 || b.x != 0.0 || b.z != 0.0 || c.x != 0.0 || c.y != 0.0;
                let lengths = Point::new(a.x, b.y, c.z);
                if off_diagonal || !lengths.iter().all(|l| l.is_finite() && *l > 0.0) {
                    return Err(Error::config(
                        "periodic box must be orthorhombic with positive lengths",
                    ));
                }
                Some(lengths)
            }
        };
        if self.method == NonbondedMethod::Pme {
            let lengths = box_lengths.ok_or_else(|| {
                Error::config("PME requires periodic box vectors")
            })?;
            if self.pme_alpha <= 0.0 {
                return Err(Error::config("PME requires a positive Ewald coefficient"));
            }
            if self.pme_grid.iter().any(|&k| k < crate::pme::PME_ORDER) {
                return Err(Error::config(
                    "PME grid dimensions must be at least the spline order",
                ));
            }
            if self.cutoff <= 0.0 {
                return Err(Error::config("PME requires a positive cutoff distance"));
            }
            let half_min = 0.5 * lengths.iter().fold(f64::INFINITY, |m, &l| m.min(l));
            if self.cutoff > half_min {
                return Err(Error::config(format!(
                    "cutoff {} exceeds half the smallest box length {half_min}",
                    self.cutoff
                )));
            }
        }
        if !(self.mutual_epsilon > 0.0) {
            return Err(Error::config("mutual induced target epsilon must be positive"));
        }

        debug!(
            "built multipole model: {n} particles, {:?}, {:?} polarization",
            self.method, self.polarization
        );
        Ok(Model {
            multipoles: self.multipoles,
            scale_table,
            method: self.method,
            cutoff: self.cutoff,
            pme_alpha: self.pme_alpha,
            pme_grid: self.pme_grid,
            polarization: self.polarization,
            mutual_epsilon: self.mutual_epsilon,
            default_thole_width: self.default_thole_width,
            box_lengths,
        })
    }
}

/// Immutable, validated multipole model. One instance may be evaluated
/// repeatedly (sequentially); evaluations share no mutable state.
#[derive(Clone, Debug)]
pub struct Model {
    multipoles: Vec<MultipoleDef>,
    scale_table: ScaleTable,
    method: NonbondedMethod,
    cutoff: f64,
    pme_alpha: f64,
    pme_grid: [usize; 3],
    polarization: Polarization,
    mutual_epsilon: f64,
    default_thole_width: f64,
    box_lengths: Option<Point>,
}

impl Model {
    pub fn num_particles(&self) -> usize {
        self.multipoles.len()
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    /// Evaluate energy (kJ/mol) and optionally forces (kJ/mol/nm) for the
    /// given positions (nm).
    pub fn evaluate(&self, positions: &[Point], what: Selection) -> Result<Evaluation, Error> {
        if positions.len() != self.multipoles.len() {
            return Err(Error::config(format!(
                "expected {} positions, got {}",
                self.multipoles.len(),
                positions.len()
            )));
        }
        if positions.iter().any(|p| !p.x.is_finite() || !p.y.is_finite() || !p.z.is_finite()) {
            return Err(Error::config("positions must be finite"));
        }
        let want_forces = what == Selection::EnergyAndForces;

        let mut state = EvalState::prepare(self, positions, want_forces)?;
        match self.method {
            NonbondedMethod::NoCutoff => state.run_nocutoff()?,
            NonbondedMethod::Pme => state.run_pme()?,
        }
        Ok(state.finish())
    }

    fn def(&self, i: usize) -> &MultipoleDef {
        &self.multipoles[i]
    }

    /// Thole damping argument for the permanent→induced (direct) sector,
    /// `u = (tholeᵢ + tholeⱼ)·r / (ᾱᵢᾱⱼ)^{1/6}`; `None` disables damping.
    fn direct_damping(&self, i: usize, j: usize, r: f64) -> Option<f64> {
        let radius = self.damp_radius(i, j)?;
        Some((self.def(i).thole + self.def(j).thole) * r / radius)
    }

    /// Damping argument for the induced↔induced (mutual) sector, using
    /// the configured default Thole width.
    fn mutual_damping(&self, i: usize, j: usize, r: f64) -> Option<f64> {
        let radius = self.damp_radius(i, j)?;
        Some(self.default_thole_width * r / radius)
    }

    fn damp_radius(&self, i: usize, j: usize) -> Option<f64> {
        let product = self.def(i).mean_polarizability() * self.def(j).mean_polarizability();
        if product == 0.0 {
            None
        } else {
            Some(product.powf(1.0 / 6.0))
        }
    }
}

/// Per-evaluation scratch: lab-frame data and bare-unit accumulators.
struct EvalState<'a> {
    model: &'a Model,
    positions: &'a [Point],
    want_forces: bool,
    moments: Vec<Moments>,
    alphas: Vec<Matrix3>,
    energy: f64,
    forces: Vec<Point>,
    torques: Vec<Point>,
}

impl<'a> EvalState<'a> {
    fn prepare(model: &'a Model, positions: &'a [Point], want_forces: bool) -> Result<Self, Error> {
        let n = positions.len();
        let mut moments = Vec::with_capacity(n);
        let mut alphas = Vec::with_capacity(n);
        for (i, def) in model.multipoles.iter().enumerate() {
            let rotation = frame::build_rotation(i, def, positions)?;
            let inverted = frame::is_inverted(i, def, positions);
            let (d, quad, oct) = frame::lab_moments(def, &rotation, inverted);
            moments.push(Moments {
                q: def.charge,
                d,
                quad,
                oct,
            });
            alphas.push(frame::lab_polarizability(def, &rotation));
        }
        Ok(Self {
            model,
            positions,
            want_forces,
            moments,
            alphas,
            energy: 0.0,
            forces: vec![Point::zeros(); n],
            torques: vec![Point::zeros(); n],
        })
    }

    fn separation(&self, i: usize, j: usize, minimum_image: bool) -> Result<(Point, f64), Error> {
        let mut r = self.positions[i] - self.positions[j];
        if minimum_image {
            let lengths = self.model.box_lengths.expect("validated");
            for c in 0..3 {
                r[c] -= lengths[c] * (r[c] / lengths[c]).round();
            }
        }
        let norm = r.norm();
        if norm < MIN_SEPARATION {
            return Err(Error::NumericalDomain {
                i,
                j,
                distance: norm,
            });
        }
        Ok((r, norm))
    }

    fn accumulate(&mut self, i: usize, j: usize, out: crate::realspace::PairInteraction, weight: f64) {
        self.energy += out.energy * weight;
        if self.want_forces {
            self.forces[i] += out.force * weight;
            self.forces[j] -= out.force * weight;
            self.torques[i] += out.torque_i * weight;
            self.torques[j] += out.torque_j * weight;
        }
    }

    /// Forces/torques only; the polarization energy is accounted for
    /// separately as −½ Σ μ̃·E.
    fn accumulate_forces_only(
        &mut self,
        i: usize,
        j: usize,
        out: crate::realspace::PairInteraction,
        weight: f64,
    ) {
        self.forces[i] += out.force * weight;
        self.forces[j] -= out.force * weight;
        self.torques[i] += out.torque_i * weight;
        self.torques[j] += out.torque_j * weight;
    }

    // ---------------------------------------------------------------- NoCutoff

    fn run_nocutoff(&mut self) -> Result<(), Error> {
        let n = self.positions.len();
        let model = self.model;

        // permanent-permanent, all pairs, scaled by covalent relation
        for i in 0..n {
            for j in i + 1..n {
                let (r, dist) = self.separation(i, j, false)?;
                let scale = model.scale_table.permanent_scale(i, j);
                if scale == 0.0 {
                    continue;
                }
                let b = kernels::plain(dist);
                let out = multipole_pair(&self.moments[i], &self.moments[j], &r, &b);
                self.accumulate(i, j, out, scale);
            }
        }

        // permanent field at every site, Thole-damped, group exclusions
        let mut e_perm = vec![Point::zeros(); n];
        for i in 0..n {
            for j in 0..n {
                if i == j || model.scale_table.polarization_excluded(i, j) {
                    continue;
                }
                let (r, dist) = self.separation(i, j, false)?;
                let b = self.direct_field_ladder(i, j, dist);
                e_perm[i] += field_at(&self.moments[j], &r, &b);
            }
        }

        // induction
        let positions = self.positions;
        let mut induced_field = |mu: &[Point]| -> Vec<Point> {
            let mut field = vec![Point::zeros(); n];
            for i in 0..n {
                for j in 0..n {
                    if i == j || model.scale_table.polarization_excluded(i, j) {
                        continue;
                    }
                    let r = positions[i] - positions[j];
                    let b = mutual_ladder(model, i, j, r.norm());
                    field[i] += field_at(&Moments::dipole(mu[j]), &r, &b);
                }
            }
            field
        };
        let induced = induction::solve(
            model.polarization,
            &self.alphas,
            &e_perm,
            model.mutual_epsilon,
            &mut induced_field,
        )?;

        // polarization energy −½ Σ μ̃·E
        self.energy -= 0.5
            * induced
                .effective
                .iter()
                .zip(e_perm.iter())
                .map(|(mu, e)| mu.dot(e))
                .sum::<f64>();

        if self.want_forces {
            self.polarization_forces_real(&induced, false)?;
        }
        Ok(())
    }

    /// Ladder for the permanent field / induced-permanent sector of one
    /// pair (plain Coulomb, Thole damped).
    fn direct_field_ladder(&self, i: usize, j: usize, dist: f64) -> [f64; NB] {
        match self.model.direct_damping(i, j, dist) {
            Some(u) => kernels::damped(dist, u),
            None => kernels::plain(dist),
        }
    }

    /// Real-space induced-permanent and induced-induced force terms,
    /// common to both nonbonded methods.
    fn polarization_forces_real(
        &mut self,
        induced: &InducedDipoles,
        periodic: bool,
    ) -> Result<(), Error> {
        let n = self.positions.len();
        let model = self.model;
        let cutoff2 = model.cutoff * model.cutoff;

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let excluded = model.scale_table.polarization_excluded(i, j);
                // without Ewald an excluded pair simply does not interact;
                // under Ewald its real-space part must still cancel the
                // reciprocal-space contribution
                if excluded && !periodic {
                    continue;
                }
                let (r, dist) = self.separation(i, j, periodic)?;
                if periodic && dist * dist > cutoff2 {
                    continue;
                }
                // induced dipole of i against permanent moments of j
                let b = if !periodic {
                    self.direct_field_ladder(i, j, dist)
                } else if excluded {
                    kernels::ewald_real(dist, model.pme_alpha)
                } else {
                    ewald_damped_ladder(model, i, j, dist, DampKind::Direct)
                };
                let mu_i = Moments::dipole(induced.effective[i]);
                let out = multipole_pair(&mu_i, &self.moments[j], &r, &b);
                self.accumulate_forces_only(i, j, out, 1.0);

                // induced-induced cross terms (i < j covers both
                // orientations explicitly)
                if i < j && !induced.cross_terms.is_empty() {
                    let b = if !periodic {
                        mutual_ladder(model, i, j, dist)
                    } else if excluded {
                        kernels::ewald_real(dist, model.pme_alpha)
                    } else {
                        ewald_damped_ladder(model, i, j, dist, DampKind::Mutual)
                    };
                    for &(a, c, w) in &induced.cross_terms {
                        let out = multipole_pair(
                            &Moments::dipole(induced.orders[a][i]),
                            &Moments::dipole(induced.orders[c][j]),
                            &r,
                            &b,
                        );
                        self.accumulate_forces_only(i, j, out, w);
                        let out = multipole_pair(
                            &Moments::dipole(induced.orders[a][j]),
                            &Moments::dipole(induced.orders[c][i]),
                            &(-r),
                            &b,
                        );
                        self.accumulate_forces_only(j, i, out, w);
                    }
                }
            }
        }

        // under Ewald, excluded pairs still need the bare-kernel
        // subtraction that cancels their reciprocal-space contribution
        if periodic {
            let excluded: Vec<(usize, usize)> = model.scale_table.excluded_pairs().collect();
            for (i, j) in excluded {
                let (r, dist) = self.separation(i, j, true)?;
                let mut b = kernels::plain(dist);
                b.iter_mut().for_each(|v| *v = -*v);
                let out = multipole_pair(
                    &Moments::dipole(induced.effective[i]),
                    &self.moments[j],
                    &r,
                    &b,
                );
                self.accumulate_forces_only(i, j, out, 1.0);
                let out = multipole_pair(
                    &Moments::dipole(induced.effective[j]),
                    &self.moments[i],
                    &(-r),
                    &b,
                );
                self.accumulate_forces_only(j, i, out, 1.0);
                for &(a, c, w) in &induced.cross_terms {
                    let out = multipole_pair(
                        &Moments::dipole(induced.orders[a][i]),
                        &Moments::dipole(induced.orders[c][j]),
                        &r,
                        &b,
                    );
                    self.accumulate_forces_only(i, j, out, w);
                    let out = multipole_pair(
                        &Moments::dipole(induced.orders[a][j]),
                        &Moments::dipole(induced.orders[c][i]),
                        &(-r),
                        &b,
                    );
                    self.accumulate_forces_only(j, i, out, w);
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------- PME

    fn run_pme(&mut self) -> Result<(), Error> {
        let n = self.positions.len();
        let model = self.model;
        let lengths = model.box_lengths.expect("validated");
        let pme = Pme::new(model.pme_alpha, model.pme_grid, lengths);
        let cutoff2 = model.cutoff * model.cutoff;
        let alpha = model.pme_alpha;

        // real space permanent-permanent within cutoff
        for i in 0..n {
            for j in i + 1..n {
                let (r, dist) = self.separation(i, j, true)?;
                if dist * dist > cutoff2 {
                    continue;
                }
                let b = kernels::ewald_real(dist, alpha);
                let out = multipole_pair(&self.moments[i], &self.moments[j], &r, &b);
                self.accumulate(i, j, out, 1.0);
            }
        }
        // corrections for covalently scaled pairs (independent of cutoff)
        let scaled: Vec<(usize, usize, f64)> = model.scale_table.scaled_pairs().collect();
        for (i, j, s) in scaled {
            let (r, dist) = self.separation(i, j, true)?;
            let mut b = kernels::plain(dist);
            b.iter_mut().for_each(|v| *v *= s - 1.0);
            let out = multipole_pair(&self.moments[i], &self.moments[j], &r, &b);
            self.accumulate(i, j, out, 1.0);
        }

        // reciprocal space of the permanent multipoles
        let mut grid_perm = pme.spread(self.positions, &self.moments);
        pme.convolve(&mut grid_perm);
        let ladders: Vec<_> = self
            .positions
            .iter()
            .map(|p| pme.probe(&grid_perm, p, self.want_forces))
            .collect();
        for (i, ladder) in ladders.iter().enumerate() {
            self.energy += 0.5 * ladder.energy(&self.moments[i]);
            if self.want_forces {
                self.forces[i] += ladder.force(&self.moments[i]);
                self.torques[i] += ladder.torque(&self.moments[i]);
            }
        }
        self.energy += pme.self_energy(&self.moments);
        self.energy += pme.background_energy(&self.moments);

        // permanent field: damped real space + reciprocal − self
        let mut e_perm = vec![Point::zeros(); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (r, dist) = self.separation(i, j, true)?;
                if dist * dist > cutoff2 {
                    continue;
                }
                let excluded = model.scale_table.polarization_excluded(i, j);
                let b = if excluded {
                    kernels::ewald_real(dist, alpha)
                } else {
                    ewald_damped_ladder(model, i, j, dist, DampKind::Direct)
                };
                e_perm[i] += field_at(&self.moments[j], &r, &b);
            }
        }
        let excluded_pairs: Vec<(usize, usize)> = model.scale_table.excluded_pairs().collect();
        for &(i, j) in &excluded_pairs {
            let (r, dist) = self.separation(i, j, true)?;
            let mut b = kernels::plain(dist);
            b.iter_mut().for_each(|v| *v = -*v);
            e_perm[i] += field_at(&self.moments[j], &r, &b);
            e_perm[j] += field_at(&self.moments[i], &(-r), &b);
        }
        let self_factor = pme.self_field_factor();
        for (i, ladder) in ladders.iter().enumerate() {
            e_perm[i] += ladder.field() + self.moments[i].d * self_factor;
        }

        // induction with full Ewald dipole fields
        let positions = self.positions;
        let mut induced_field = |mu: &[Point]| -> Vec<Point> {
            let dipoles: Vec<Moments> = mu.iter().map(|m| Moments::dipole(*m)).collect();
            let mut grid = pme.spread(positions, &dipoles);
            pme.convolve(&mut grid);
            let mut field: Vec<Point> = positions
                .iter()
                .zip(mu.iter())
                .map(|(p, m)| pme.probe(&grid, p, false).field() + m * self_factor)
                .collect();
            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let mut r = positions[i] - positions[j];
                    for c in 0..3 {
                        r[c] -= lengths[c] * (r[c] / lengths[c]).round();
                    }
                    let dist = r.norm();
                    if dist * dist > cutoff2 {
                        continue;
                    }
                    let excluded = model.scale_table.polarization_excluded(i, j);
                    let b = if excluded {
                        kernels::ewald_real(dist, alpha)
                    } else {
                        ewald_damped_ladder(model, i, j, dist, DampKind::Mutual)
                    };
                    field[i] += field_at(&dipoles[j], &r, &b);
                }
            }
            for &(i, j) in &excluded_pairs {
                let mut r = positions[i] - positions[j];
                for c in 0..3 {
                    r[c] -= lengths[c] * (r[c] / lengths[c]).round();
                }
                let dist = r.norm();
                let mut b = kernels::plain(dist);
                b.iter_mut().for_each(|v| *v = -*v);
                field[i] += field_at(&dipoles[j], &r, &b);
                field[j] += field_at(&dipoles[i], &(-r), &b);
            }
            field
        };
        let induced = induction::solve(
            model.polarization,
            &self.alphas,
            &e_perm,
            model.mutual_epsilon,
            &mut induced_field,
        )?;

        self.energy -= 0.5
            * induced
                .effective
                .iter()
                .zip(e_perm.iter())
                .map(|(mu, e)| mu.dot(e))
                .sum::<f64>();

        if self.want_forces {
            self.polarization_forces_real(&induced, true)?;
            self.polarization_forces_recip(&pme, &grid_perm, &induced);
        }
        Ok(())
    }

    /// Reciprocal-space gradient terms of the polarization energy: the
    /// policy dipoles against the permanent potential grid, the permanent
    /// moments against the policy-dipole grid, and the weighted
    /// induced-induced cross terms.
    fn polarization_forces_recip(
        &mut self,
        pme: &Pme,
        grid_perm: &[rustfft::num_complex::Complex<f64>],
        induced: &InducedDipoles,
    ) {
        let n = self.positions.len();

        // potential grid of the policy dipoles
        let effective: Vec<Moments> = induced
            .effective
            .iter()
            .map(|m| Moments::dipole(*m))
            .collect();
        let mut grid_eff = pme.spread(self.positions, &effective);
        pme.convolve(&mut grid_eff);

        for i in 0..n {
            // permanent potential acting on the induced dipole
            let ladder_p = pme.probe(grid_perm, &self.positions[i], true);
            self.forces[i] += ladder_p.force(&effective[i]);
            self.torques[i] += ladder_p.torque(&effective[i]);
            // induced-dipole potential acting on the permanent moments
            let ladder_d = pme.probe(&grid_eff, &self.positions[i], true);
            self.forces[i] += ladder_d.force(&self.moments[i]);
            self.torques[i] += ladder_d.torque(&self.moments[i]);
        }

        if induced.cross_terms.is_empty() {
            return;
        }
        // distinct order grids referenced by the cross-term table
        let max_order = induced
            .cross_terms
            .iter()
            .map(|&(a, b, _)| a.max(b))
            .max()
            .unwrap_or(0);
        let mut order_grids = Vec::with_capacity(max_order + 1);
        for order in 0..=max_order {
            let dipoles: Vec<Moments> = induced.orders[order]
                .iter()
                .map(|m| Moments::dipole(*m))
                .collect();
            let mut grid = pme.spread(self.positions, &dipoles);
            pme.convolve(&mut grid);
            order_grids.push(grid);
        }
        for &(a, b, w) in &induced.cross_terms {
            for i in 0..n {
                let ladder_b = pme.probe(&order_grids[b], &self.positions[i], true);
                let mu_a = Moments::dipole(induced.orders[a][i]);
                self.forces[i] += ladder_b.force(&mu_a) * w;
                self.torques[i] += ladder_b.torque(&mu_a) * w;
                let ladder_a = pme.probe(&order_grids[a], &self.positions[i], true);
                let mu_b = Moments::dipole(induced.orders[b][i]);
                self.forces[i] += ladder_a.force(&mu_b) * w;
                self.torques[i] += ladder_a.torque(&mu_b) * w;
            }
        }
    }

    fn finish(mut self) -> Evaluation {
        let ke = coulomb_factor();
        self.energy *= ke;
        if !self.want_forces {
            return Evaluation {
                energy: self.energy,
                forces: None,
            };
        }
        for f in self.forces.iter_mut() {
            *f *= ke;
        }
        for t in self.torques.iter_mut() {
            *t *= ke;
        }
        // convert multipole torques into anchor forces
        let torques = std::mem::take(&mut self.torques);
        for (i, torque) in torques.iter().enumerate() {
            if torque.norm_squared() > 0.0 {
                frame::map_torque_to_forces(
                    i,
                    self.model.def(i),
                    self.positions,
                    torque,
                    &mut self.forces,
                );
            }
        }
        Evaluation {
            energy: self.energy,
            forces: Some(self.forces),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DampKind {
    Direct,
    Mutual,
}

/// Plain Thole-damped ladder for the mutual sector.
fn mutual_ladder(model: &Model, i: usize, j: usize, dist: f64) -> [f64; NB] {
    match model.mutual_damping(i, j, dist) {
        Some(u) => kernels::damped(dist, u),
        None => kernels::plain(dist),
    }
}

/// Ewald ladder with the short-range Thole correction folded in:
/// `B_ewald + (B_damped − B_plain)` so the total (real + reciprocal)
/// interaction equals the damped bare one.
fn ewald_damped_ladder(model: &Model, i: usize, j: usize, dist: f64, kind: DampKind) -> [f64; NB] {
    let mut b = kernels::ewald_real(dist, model.pme_alpha);
    let u = match kind {
        DampKind::Direct => model.direct_damping(i, j, dist),
        DampKind::Mutual => model.mutual_damping(i, j, dist),
    };
    if let Some(u) = u {
        let damped = kernels::damped(dist, u);
        let plain = kernels::plain(dist);
        for n in 0..NB {
            b[n] += damped[n] - plain[n];
        }
    }
    b
}
