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

//! Regression tests pinning energies and per-particle forces for small
//! water and methanol systems under every combination of summation method
//! and polarization policy, plus the 1-4 scaling identities of the
//! four-charge square.

mod common;

use common::{assert_close, assert_forces_close, charge_square, methanol_pair, water_dimer};
use multipolar::{ModelBuilder, NonbondedMethod, Polarization, Selection};

const TOL: f64 = 1e-4;

#[test]
fn charge_square_14_scaling_nocutoff() {
    for (scale, expected) in [(1.0, -1389.35), (0.5, -1389.35 / 2.0), (0.0, 0.0)] {
        let mut builder = ModelBuilder::new();
        let positions = charge_square(&mut builder, 2.0);
        builder.nonbonded_method(NonbondedMethod::NoCutoff);
        builder.scale_factor_14(scale);
        let model = builder.build().unwrap();
        let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
        assert_close(expected, out.energy, 1e-5);
    }
}

#[test]
fn charge_square_14_scaling_pme() {
    for (scale, expected) in [(1.0, -1389.35), (0.5, -1389.35 / 2.0), (0.0, 0.0)] {
        let mut builder = ModelBuilder::new();
        let positions = charge_square(&mut builder, 3.0);
        builder.nonbonded_method(NonbondedMethod::Pme);
        builder.cutoff(0.4);
        builder.pme_parameters(0.001, 64, 64, 64);
        builder.scale_factor_14(scale);
        let model = builder.build().unwrap();
        let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
        assert_close(expected, out.energy, 1e-3);
    }
}

fn water_model(
    method: NonbondedMethod,
    alpha: f64,
    policy: Polarization,
    epsilon: Option<f64>,
) -> (multipolar::Model, Vec<multipolar::Point>) {
    let mut builder = ModelBuilder::new();
    let positions = water_dimer(&mut builder, true);
    builder.nonbonded_method(method);
    builder.default_thole_width(3.0);
    builder.polarization(policy);
    if method == NonbondedMethod::Pme {
        builder.cutoff(0.6);
        builder.pme_parameters(alpha, 64, 64, 64);
    }
    if let Some(eps) = epsilon {
        builder.mutual_epsilon(eps);
    }
    (builder.build().unwrap(), positions)
}

#[test]
fn water_dimer_nocutoff_direct() {
    let (model, positions) = water_model(
        NonbondedMethod::NoCutoff,
        0.0,
        Polarization::Direct,
        None,
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(-1.949902453, out.energy, TOL);
    let reference = [
        [-138.7310812, -182.9709838, 35.70961618],
        [37.1153441, -5.548490702, 5.04277195],
        [41.13860764, 118.8270727, 31.47279046],
        [-116.4297925, -100.864177, -27.61517965],
        [126.6370205, 165.8966158, -19.33373258],
        [50.26990146, 4.659962993, -25.27626636],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn water_dimer_pme_direct() {
    let (model, positions) = water_model(
        NonbondedMethod::Pme,
        3.0001,
        Polarization::Direct,
        None,
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(-2.523318862, out.energy, TOL);
    let reference = [
        [-138.9578383, -183.3187212, 31.05996292],
        [36.78883138, -5.591080652, 7.601999899],
        [41.46403045, 118.9693325, 34.16137849],
        [-116.5222458, -100.9480058, -32.82501978],
        [126.6226866, 166.1966239, -17.03839082],
        [50.6045891, 4.691845173, -22.96008637],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn water_dimer_nocutoff_mutual() {
    let (model, positions) = water_model(
        NonbondedMethod::NoCutoff,
        0.0,
        Polarization::Mutual,
        Some(1e-8),
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(-1.952917117, out.energy, TOL);
    let reference = [
        [-139.7835608, -184.4337529, 35.62953533],
        [37.434981, -5.522902943, 5.11681405],
        [41.23101208, 119.3674074, 31.61700973],
        [-116.9476192, -101.4714619, -27.86430037],
        [127.7709383, 167.4188741, -19.23010497],
        [50.29424862, 4.641836191, -25.26895377],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn water_dimer_pme_mutual() {
    let (model, positions) = water_model(
        NonbondedMethod::Pme,
        3.0,
        Polarization::Mutual,
        Some(1e-8),
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(-2.533082539, out.energy, TOL);
    let reference = [
        [-140.0801113, -184.8502938, 30.90206227],
        [37.10990648, -5.575145037, 7.692659824],
        [41.55181662, 119.50422, 34.31895915],
        [-117.0338412, -101.5516429, -33.10846732],
        [127.7947382, 167.7834207, -16.87461724],
        [50.65754476, 4.689434353, -22.93075376],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn water_dimer_nocutoff_extrapolated() {
    let (model, positions) = water_model(
        NonbondedMethod::NoCutoff,
        0.0,
        Polarization::Extrapolated,
        None,
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(-1.94668563, out.energy, TOL);
    let reference = [
        [-139.8529084, -184.5568497, 35.69566243],
        [37.47391144, -5.507167568, 5.113662284],
        [41.24807762, 119.4349691, 31.61668322],
        [-117.0172298, -101.5532625, -27.86681578],
        [127.8817331, 167.5584812, -19.27180201],
        [50.26641605, 4.623829403, -25.28739015],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn water_dimer_pme_extrapolated() {
    let (model, positions) = water_model(
        NonbondedMethod::Pme,
        3.0,
        Polarization::Extrapolated,
        None,
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(-2.527846018, out.energy, TOL);
    let reference = [
        [-140.156749, -184.9802098, 30.95576142],
        [37.14821556, -5.561204369, 7.691990976],
        [41.56730743, 119.5695275, 34.32030003],
        [-117.1007878, -101.6308286, -33.11577527],
        [127.9092349, 167.929753, -16.90691988],
        [50.63283256, 4.672955505, -22.94551458],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

fn methanol_model(
    method: NonbondedMethod,
    policy: Polarization,
    epsilon: Option<f64>,
) -> (multipolar::Model, Vec<multipolar::Point>) {
    let mut builder = ModelBuilder::new();
    let positions = methanol_pair(&mut builder);
    builder.nonbonded_method(method);
    builder.default_thole_width(3.0);
    builder.polarization(policy);
    if method == NonbondedMethod::Pme {
        builder.cutoff(1.2);
        builder.pme_parameters(4.5, 64, 64, 64);
    }
    if let Some(eps) = epsilon {
        builder.mutual_epsilon(eps);
    }
    (builder.build().unwrap(), positions)
}

#[test]
fn methanol_nocutoff_direct() {
    let (model, positions) = methanol_model(NonbondedMethod::NoCutoff, Polarization::Direct, None);
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(100.1426571, out.energy, TOL);
    let reference = [
        [0.6174848862, 1.244067416, 0.348981665],
        [3.137044182, 3.021402996, -1.106973251],
        [-171.9428202, -56.29908471, 12.15602242],
        [54.08049294, 41.61038079, -18.72605327],
        [67.10967846, 11.90263439, 23.93203305],
        [46.43698088, -2.657546533, -16.65203133],
        [1.1456374, -1.273419433, -2.195068492],
        [3.279289766, -2.747123834, -6.42588385],
        [11.97737104, -47.37054551, 204.7348033],
        [13.21305881, -12.64877074, -64.79230192],
        [-26.64547941, 2.986613971, -46.17381233],
        [-2.408738783, 62.23139119, -85.099716],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn methanol_nocutoff_mutual() {
    let (model, positions) =
        methanol_model(NonbondedMethod::NoCutoff, Polarization::Mutual, Some(1e-9));
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(100.1424251, out.energy, TOL);
    let reference = [
        [0.6146835636, 1.24282615, 0.3501711642],
        [3.13797926, 3.015595591, -1.097188673],
        [-171.9420969, -56.29281618, 12.14742654],
        [54.08018498, 41.61211644, -18.72680649],
        [67.11010165, 11.90386444, 23.93032756],
        [46.43703861, -2.656708806, -16.65281219],
        [1.148286492, -1.284971833, -2.197342953],
        [3.272556789, -2.742411944, -6.424646877],
        [11.97974305, -47.36853963, 204.7356438],
        [13.21447088, -12.64805524, -64.79191248],
        [-26.64493967, 2.987395526, -46.17328869],
        [-2.40800871, 62.23170548, -85.09957069],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn methanol_nocutoff_extrapolated() {
    let (model, positions) = methanol_model(
        NonbondedMethod::NoCutoff,
        Polarization::Extrapolated,
        None,
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(100.1424271, out.energy, TOL);
    let reference = [
        [0.6144183532, 1.242877198, 0.3502970714],
        [3.13789228, 3.015096318, -1.095457146],
        [-171.941967, -56.29241757, 12.14584015],
        [54.08021516, 41.61225418, -18.72696219],
        [67.11022091, 11.90392367, 23.93009922],
        [46.43708221, -2.656656187, -16.65293107],
        [1.148617423, -1.286157531, -2.197592114],
        [3.271428661, -2.741098117, -6.424340583],
        [11.98035816, -47.36903306, 204.7356612],
        [13.21458611, -12.64799137, -64.79184765],
        [-26.64490265, 2.987465959, -46.17322487],
        [-2.40794957, 62.2317365, -85.09954205],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn methanol_pme_direct() {
    let (model, positions) = methanol_model(NonbondedMethod::Pme, Polarization::Direct, None);
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(100.048119, out.energy, TOL);
    let reference = [
        [0.4407512632, 0.9533272891, 0.2662227116],
        [2.777987186, 1.840858052, -1.333640734],
        [-171.6344629, -55.43492185, 12.32086698],
        [54.15942246, 41.78995026, -18.66314014],
        [67.2048408, 12.09783528, 23.99010209],
        [46.52456681, -2.469100554, -16.59349719],
        [0.9792294678, -1.511490917, -2.188302524],
        [2.487119928, -3.695492757, -6.600407624],
        [12.53120547, -46.68073149, 204.8161],
        [13.32630506, -12.47148185, -64.76480367],
        [-26.51166625, 3.163119144, -46.15867739],
        [-2.28426176, 62.41964403, -85.09330594],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn methanol_pme_mutual() {
    let (model, positions) =
        methanol_model(NonbondedMethod::Pme, Polarization::Mutual, Some(1e-9));
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(100.0480699, out.energy, TOL);
    let reference = [
        [0.4388490535, 0.9521698628, 0.2671848666],
        [2.77743403, 1.838052623, -1.324369675],
        [-171.6330632, -55.43091584, 12.31209076],
        [54.15929787, 41.79141719, -18.66382841],
        [67.20544012, 12.09872923, 23.98850965],
        [46.52468443, -2.468565193, -16.59413613],
        [0.9812786184, -1.522494372, -2.19205581],
        [2.482142255, -3.688423769, -6.596946686],
        [12.53264302, -46.6801623, 204.8169521],
        [13.32737364, -12.47126727, -64.76450554],
        [-26.51129625, 3.16340949, -46.15822949],
        [-2.283744668, 62.41956649, -85.09314563],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn methanol_pme_extrapolated() {
    let (model, positions) = methanol_model(
        NonbondedMethod::Pme,
        Polarization::Extrapolated,
        None,
    );
    let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
    assert_close(100.0480906, out.energy, TOL);
    let reference = [
        [0.438635498, 0.9521799034, 0.2673223945],
        [2.777143984, 1.837985034, -1.32278651],
        [-171.6327822, -55.43082349, 12.31056078],
        [54.15935455, 41.79153141, -18.66398402],
        [67.20558687, 12.0987565, 23.9882874],
        [46.52473894, -2.46854161, -16.59424569],
        [0.9814929295, -1.523627818, -2.192349756],
        [2.481269398, -3.686996821, -6.596448702],
        [12.53309724, -46.68066444, 204.8169435],
        [13.32746646, -12.47126075, -64.76446756],
        [-26.51126553, 3.163426109, -46.15818436],
        [-2.283699129, 62.41955233, -85.09312721],
    ];
    assert_forces_close(&reference, &out.forces.unwrap(), TOL);
}

#[test]
fn zero_polarizability_policies_agree() {
    let mut results = Vec::new();
    for policy in [
        Polarization::Direct,
        Polarization::Mutual,
        Polarization::Extrapolated,
    ] {
        let mut builder = ModelBuilder::new();
        let positions = water_dimer(&mut builder, false);
        builder.nonbonded_method(NonbondedMethod::NoCutoff);
        builder.default_thole_width(3.0);
        builder.polarization(policy);
        let model = builder.build().unwrap();
        let out = model.evaluate(&positions, Selection::EnergyAndForces).unwrap();
        results.push(out);
    }
    for other in &results[1..] {
        assert_eq!(results[0].energy, other.energy);
        assert_eq!(
            results[0].forces.as_ref().unwrap(),
            other.forces.as_ref().unwrap()
        );
    }
}

#[test]
fn tightening_epsilon_is_bounded_by_epsilon() {
    let loose = water_model(
        NonbondedMethod::NoCutoff,
        0.0,
        Polarization::Mutual,
        Some(1e-4),
    );
    let tight = water_model(
        NonbondedMethod::NoCutoff,
        0.0,
        Polarization::Mutual,
        Some(1e-8),
    );
    let e_loose = loose.0.evaluate(&loose.1, Selection::Energy).unwrap().energy;
    let e_tight = tight.0.evaluate(&tight.1, Selection::Energy).unwrap().energy;
    assert!((e_loose - e_tight).abs() <= 1e-4);
}
