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

//! Shared reference systems for the integration tests: a four-charge
//! square probing 1-4 scaling, a water dimer with full multipoles and
//! isotropic polarizabilities, and a methanol pair with anisotropic
//! polarizabilities and Z-only frames.

use multipolar::tensor::{Symmetric2, Symmetric3};
use multipolar::{AxisType, CovalentKind, ModelBuilder, MultipoleDef, Point};

/// Asserts |expected − found| ≤ tol·max(1, |expected|): relative
/// tolerance above unit magnitude, absolute below.
pub fn assert_close(expected: f64, found: f64, tol: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (expected - found).abs() <= tol * scale,
        "expected {expected}, found {found} (tol {tol})"
    );
}

pub fn assert_forces_close(expected: &[[f64; 3]], found: &[Point], tol: f64) {
    assert_eq!(expected.len(), found.len());
    for (n, (e, f)) in expected.iter().zip(found.iter()).enumerate() {
        for c in 0..3 {
            let scale = e[c].abs().max(1.0);
            assert!(
                (e[c] - f[c]).abs() <= tol * scale,
                "force component {c} of particle {n}: expected {}, found {}",
                e[c],
                f[c]
            );
        }
    }
}

pub fn cubic_box(builder: &mut ModelBuilder, edge: f64) {
    builder.box_vectors(
        Point::new(edge, 0.0, 0.0),
        Point::new(0.0, edge, 0.0),
        Point::new(0.0, 0.0, edge),
    );
}

/// Four unit charges on a square:
///
/// ```text
/// 0  3
/// |  |
/// 1--2
/// ```
///
/// 0-3 is the only 1-4 related pair; every other pair is 1-2 or 1-3
/// scaled to zero, so the total energy probes the 1-4 factor alone.
pub fn charge_square(builder: &mut ModelBuilder, box_edge: f64) -> Vec<Point> {
    for charge in [1.0, 1.0, -1.0, -1.0] {
        builder.add_multipole(MultipoleDef::from_charge(charge));
    }
    builder.set_covalent_map(0, CovalentKind::Covalent12, &[1]);
    builder.set_covalent_map(0, CovalentKind::Covalent13, &[2]);
    builder.set_covalent_map(0, CovalentKind::Covalent14, &[3]);
    builder.set_covalent_map(1, CovalentKind::Covalent12, &[0, 2]);
    builder.set_covalent_map(1, CovalentKind::Covalent13, &[3]);
    builder.set_covalent_map(2, CovalentKind::Covalent12, &[1, 3]);
    builder.set_covalent_map(2, CovalentKind::Covalent13, &[0]);
    builder.set_covalent_map(3, CovalentKind::Covalent12, &[2]);
    builder.set_covalent_map(3, CovalentKind::Covalent13, &[1]);
    builder.set_covalent_map(3, CovalentKind::Covalent14, &[0]);
    cubic_box(builder, box_edge);
    vec![
        Point::new(0.1, 0.0, 0.0),
        Point::new(0.0, 0.0, 0.0),
        Point::new(0.0, 0.1, 0.0),
        Point::new(0.1, 0.1, 0.0),
    ]
}

fn water_oxygen(base: usize, polarizable: bool) -> MultipoleDef {
    MultipoleDef {
        charge: -0.51966,
        dipole: Point::new(0.0, 0.0, 0.00755612136146),
        quadrupole: Symmetric2([
            0.000354030721139,
            0.0,
            -0.000390257077096,
            0.0,
            0.0,
            3.62263559571e-05,
        ]),
        octupole: Symmetric3([
            0.0,
            0.0,
            0.0,
            0.0,
            -6.285758282686837e-07,
            0.0,
            -9.452653225954594e-08,
            0.0,
            0.0,
            7.231018665791977e-07,
        ]),
        axis: AxisType::Bisector,
        anchor_z: Some(base + 1),
        anchor_x: Some(base + 2),
        anchor_y: None,
        thole: 0.39,
        polarizability: if polarizable {
            Point::new(0.000837, 0.000837, 0.000837)
        } else {
            Point::zeros()
        },
    }
}

fn water_hydrogen(anchor_z: usize, anchor_x: usize, polarizable: bool) -> MultipoleDef {
    MultipoleDef {
        charge: 0.25983,
        dipole: Point::new(-0.00204209484795, 0.0, -0.00307875299958),
        quadrupole: Symmetric2([
            -3.42848248983e-05,
            0.0,
            -0.000100240875193,
            -1.89485963908e-06,
            0.0,
            0.000134525700091,
        ]),
        octupole: Symmetric3([
            -2.405600937552608e-07,
            0.0,
            -6.415084018183151e-08,
            0.0,
            -1.152422607026746e-06,
            0.0,
            -2.558537436767218e-06,
            3.047102424084479e-07,
            0.0,
            3.710960043793964e-06,
        ]),
        axis: AxisType::ZThenX,
        anchor_z: Some(anchor_z),
        anchor_x: Some(anchor_x),
        anchor_y: None,
        thole: 0.39,
        polarizability: if polarizable {
            Point::new(0.000496, 0.000496, 0.000496)
        } else {
            Point::zeros()
        },
    }
}

/// Two water molecules (O, H1, H2 per molecule): bisector frame on
/// oxygen, Z-then-X on the hydrogens, full moments through octupoles,
/// intramolecular polarization groups.
pub fn water_dimer(builder: &mut ModelBuilder, polarizable: bool) -> Vec<Point> {
    for molecule in 0..2 {
        let base = 3 * molecule;
        builder.add_multipole(water_oxygen(base, polarizable));
        builder.add_multipole(water_hydrogen(base, base + 2, polarizable));
        builder.add_multipole(water_hydrogen(base, base + 1, polarizable));
        builder.set_covalent_map(base, CovalentKind::Covalent12, &[base + 1, base + 2]);
        builder.set_covalent_map(base + 1, CovalentKind::Covalent12, &[base]);
        builder.set_covalent_map(base + 1, CovalentKind::Covalent13, &[base + 2]);
        builder.set_covalent_map(base + 2, CovalentKind::Covalent12, &[base]);
        builder.set_covalent_map(base + 2, CovalentKind::Covalent13, &[base + 1]);
        let group = [base, base + 1, base + 2];
        for atom in group {
            builder.set_covalent_map(atom, CovalentKind::PolarizationCovalent11, &group);
        }
    }
    cubic_box(builder, 2.0);
    vec![
        Point::new(0.2, 0.2, 0.2),
        Point::new(0.25, 0.2, 0.3),
        Point::new(0.15, 0.2, 0.3),
        Point::new(0.0, 0.0, 0.0),
        Point::new(0.05, 0.0, 0.1),
        Point::new(-0.05, 0.0, 0.1),
    ]
}

/// Two methanol molecules (C1, O1, HO1, H1A, H1B, H1C per molecule):
/// anisotropic polarizability on oxygen, Z-only frames on the
/// hydrogens/carbon, no polarization groups.
pub fn methanol_pair(builder: &mut ModelBuilder) -> Vec<Point> {
    for molecule in 0..2 {
        let base = 6 * molecule;
        // C1
        builder.add_multipole(MultipoleDef {
            charge: -0.140,
            axis: AxisType::ZOnly,
            anchor_z: Some(base + 1),
            thole: 1.3,
            polarizability: Point::new(0.001, 0.001, 0.001),
            ..Default::default()
        });
        // O1
        builder.add_multipole(MultipoleDef {
            charge: -0.460,
            dipole: Point::new(0.00026405942708641, 0.0, 0.00550661803258754),
            quadrupole: Symmetric2([
                9.383755641232907e-05,
                0.0,
                -0.0001547997648007625,
                -1.577493985246555e-06,
                0.0,
                6.096220838843343e-05,
            ]),
            octupole: Symmetric3([
                -3.230426667733178e-08,
                0.0,
                3.684859776955582e-08,
                0.0,
                -2.245492298396793e-07,
                0.0,
                7.675967953604524e-07,
                -4.445541285871346e-09,
                0.0,
                -5.43047565520773e-07,
            ]),
            axis: AxisType::ZThenX,
            anchor_z: Some(base),
            anchor_x: Some(base + 2),
            anchor_y: None,
            thole: 1.3,
            polarizability: Point::new(0.00100024, 0.00125025, 0.00083350),
        });
        // HO1, H1A, H1B, H1C
        for (charge, anchor) in [
            (0.360, base + 1),
            (0.080, base),
            (0.080, base),
            (0.080, base),
        ] {
            builder.add_multipole(MultipoleDef {
                charge,
                axis: AxisType::ZOnly,
                anchor_z: Some(anchor),
                ..Default::default()
            });
        }

        let idx = |offset: usize| base + offset;
        builder.set_covalent_map(idx(0), CovalentKind::Covalent12, &[idx(1), idx(3), idx(4), idx(5)]);
        builder.set_covalent_map(idx(1), CovalentKind::Covalent12, &[idx(0), idx(2)]);
        builder.set_covalent_map(idx(2), CovalentKind::Covalent12, &[idx(1)]);
        builder.set_covalent_map(idx(3), CovalentKind::Covalent12, &[idx(0)]);
        builder.set_covalent_map(idx(4), CovalentKind::Covalent12, &[idx(0)]);
        builder.set_covalent_map(idx(5), CovalentKind::Covalent12, &[idx(0)]);
        builder.set_covalent_map(idx(0), CovalentKind::Covalent13, &[idx(2)]);
        builder.set_covalent_map(idx(1), CovalentKind::Covalent13, &[idx(3), idx(4), idx(5)]);
        builder.set_covalent_map(idx(2), CovalentKind::Covalent13, &[idx(0)]);
        builder.set_covalent_map(idx(3), CovalentKind::Covalent13, &[idx(1), idx(4), idx(5)]);
        builder.set_covalent_map(idx(4), CovalentKind::Covalent13, &[idx(1), idx(3), idx(5)]);
        builder.set_covalent_map(idx(5), CovalentKind::Covalent13, &[idx(1), idx(3), idx(4)]);
    }
    cubic_box(builder, 2.461817);
    [
        [1.6118739816, -7.7986654421, -9.3388011053],
        [0.4344388195, -8.6290855266, -9.4591523136],
        [-0.2932869802, -8.1452383606, -9.0381926002],
        [1.5101797393, -6.7361319725, -9.6470249020],
        [1.8800020341, -7.7312323778, -8.2627522535],
        [2.3828031354, -8.2685172700, -9.9862796759],
        [-2.3016642008, -3.3801483374, -4.5239842701],
        [-2.6774345292, -3.8370280231, -3.2318499504],
        [-1.9568218092, -3.4707595618, -2.6956925837],
        [-1.4748236015, -3.9573461155, -4.9903514535],
        [-3.2561339708, -3.3690912389, -5.0924789477],
        [-1.9925289806, -2.3413378186, -4.2797935219],
    ]
    .iter()
    .map(|c| Point::new(c[0] * 0.1, c[1] * 0.1, c[2] * 0.1))
    .collect()
}
