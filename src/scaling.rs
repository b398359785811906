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

//! Pairwise scale factors and polarization exclusions.
//!
//! Built once from the covalent maps at model construction so that the
//! evaluation loops never walk the bonded graph. The closest covalent
//! relation wins when a pair appears in several maps (1-2 before 1-3
//! before 1-4).

use crate::params::CovalentMaps;
use std::collections::HashMap;

/// Scale factors applied to the permanent-permanent interaction of
/// covalently related pairs.
#[derive(Clone, Copy, Debug)]
pub struct ScaleFactors {
    pub scale12: f64,
    pub scale13: f64,
    pub scale14: f64,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            scale12: 0.0,
            scale13: 0.0,
            scale14: 1.0,
        }
    }
}

/// Immutable pair-scale table derived from the covalent maps.
#[derive(Clone, Debug, Default)]
pub struct ScaleTable {
    /// Scale for pairs whose permanent interaction is not at full
    /// strength, keyed by (min, max) particle index.
    scaled: HashMap<(usize, usize), f64>,
    /// Pairs excluded from all induction, keyed by (min, max).
    excluded: std::collections::HashSet<(usize, usize)>,
}

fn ordered(i: usize, j: usize) -> (usize, usize) {
    if i < j {
        (i, j)
    } else {
        (j, i)
    }
}

impl ScaleTable {
    pub fn build(maps: &CovalentMaps, factors: &ScaleFactors) -> Self {
        let mut scaled = HashMap::new();
        // graded insertion: later (closer) relations overwrite
        for (i, partners) in maps.cov14.iter().enumerate() {
            for &j in partners {
                scaled.insert(ordered(i, j), factors.scale14);
            }
        }
        for (i, partners) in maps.cov13.iter().enumerate() {
            for &j in partners {
                scaled.insert(ordered(i, j), factors.scale13);
            }
        }
        for (i, partners) in maps.cov12.iter().enumerate() {
            for &j in partners {
                scaled.insert(ordered(i, j), factors.scale12);
            }
        }
        scaled.retain(|_, s| *s != 1.0);

        let mut excluded = std::collections::HashSet::new();
        for (i, partners) in maps.polarization11.iter().enumerate() {
            for &j in partners {
                excluded.insert(ordered(i, j));
            }
        }
        Self { scaled, excluded }
    }

    /// Scale factor for the permanent-permanent interaction of a pair.
    #[inline]
    pub fn permanent_scale(&self, i: usize, j: usize) -> f64 {
        *self.scaled.get(&ordered(i, j)).unwrap_or(&1.0)
    }

    /// Whether a pair is excluded from inducing each other.
    #[inline]
    pub fn polarization_excluded(&self, i: usize, j: usize) -> bool {
        self.excluded.contains(&ordered(i, j))
    }

    /// Pairs with a permanent scale different from one, for the Ewald
    /// exclusion-correction loop.
    pub fn scaled_pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.scaled.iter().map(|(&(i, j), &s)| (i, j, s))
    }

    /// Polarization-excluded pairs, for the Ewald correction loop.
    pub fn excluded_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.excluded.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CovalentKind;

    /// The four-particle square of the reference tests:
    /// 0-1, 1-2, 2-3 bonded, 0-3 is the 1-4 pair.
    fn square_maps() -> CovalentMaps {
        let mut maps = CovalentMaps::new(4);
        maps.set(0, CovalentKind::Covalent12, &[1]);
        maps.set(0, CovalentKind::Covalent13, &[2]);
        maps.set(0, CovalentKind::Covalent14, &[3]);
        maps.set(1, CovalentKind::Covalent12, &[0, 2]);
        maps.set(1, CovalentKind::Covalent13, &[3]);
        maps.set(2, CovalentKind::Covalent12, &[1, 3]);
        maps.set(2, CovalentKind::Covalent13, &[0]);
        maps.set(3, CovalentKind::Covalent12, &[2]);
        maps.set(3, CovalentKind::Covalent13, &[1]);
        maps.set(3, CovalentKind::Covalent14, &[0]);
        maps
    }

    #[test]
    fn graded_scales() {
        let table = ScaleTable::build(&square_maps(), &ScaleFactors::default());
        assert_eq!(table.permanent_scale(0, 1), 0.0);
        assert_eq!(table.permanent_scale(0, 2), 0.0);
        assert_eq!(table.permanent_scale(0, 3), 1.0); // default 1-4 factor
        assert_eq!(table.permanent_scale(2, 1), 0.0);
    }

    #[test]
    fn scale_is_symmetric_under_pair_order() {
        let factors = ScaleFactors {
            scale14: 0.5,
            ..Default::default()
        };
        let table = ScaleTable::build(&square_maps(), &factors);
        assert_eq!(table.permanent_scale(0, 3), table.permanent_scale(3, 0));
        assert_eq!(table.permanent_scale(0, 3), 0.5);
    }

    #[test]
    fn closest_relation_wins() {
        let mut maps = square_maps();
        // also list the bonded pair as 1-4; the 1-2 zero must win
        maps.set(0, CovalentKind::Covalent14, &[1, 3]);
        maps.set(1, CovalentKind::Covalent14, &[0]);
        maps.set(3, CovalentKind::Covalent14, &[0]);
        let table = ScaleTable::build(&maps, &ScaleFactors::default());
        assert_eq!(table.permanent_scale(0, 1), 0.0);
    }

    #[test]
    fn polarization_exclusions() {
        let mut maps = CovalentMaps::new(3);
        maps.set(0, CovalentKind::PolarizationCovalent11, &[1, 2]);
        maps.set(1, CovalentKind::PolarizationCovalent11, &[0, 2]);
        maps.set(2, CovalentKind::PolarizationCovalent11, &[0, 1]);
        let table = ScaleTable::build(&maps, &ScaleFactors::default());
        assert!(table.polarization_excluded(0, 1));
        assert!(table.polarization_excluded(2, 1));
        assert_eq!(table.permanent_scale(0, 1), 1.0);
    }
}
