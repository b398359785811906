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

//! Unit conventions and derived physical constants.
//!
//! All public interfaces use nanometers, elementary charges and kJ/mol.
//! Dipoles are e·nm, quadrupoles e·nm², octupoles e·nm³ and
//! polarizabilities nm³ (polarizability-volume convention, so an induced
//! dipole is polarizability times a bare field with no vacuum-permittivity
//! factor).

use physical_constants::{
    AVOGADRO_CONSTANT, ELEMENTARY_CHARGE, VACUUM_ELECTRIC_PERMITTIVITY,
};

/// Coulomb prefactor 1/(4πε₀) in kJ·mol⁻¹·nm·e⁻².
///
/// Internal accumulation is done in bare units of e²/nm and scaled by this
/// factor once at the end of an evaluation.
pub fn coulomb_factor() -> f64 {
    // e² N_A / (4π ε₀) in J·m, converted to kJ/mol·nm
    ELEMENTARY_CHARGE * ELEMENTARY_CHARGE * AVOGADRO_CONSTANT
        / (4.0 * std::f64::consts::PI * VACUUM_ELECTRIC_PERMITTIVITY)
        * 1e9
        / 1e3
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    #[test]
    fn coulomb_factor_matches_convention() {
        // The value used throughout the molecular simulation ecosystem.
        assert_relative_eq!(super::coulomb_factor(), 138.935456, epsilon = 1e-4);
    }
}
