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

//! Error type shared by model setup and evaluation.

use thiserror::Error;

/// Failures surfaced by model construction or evaluation.
///
/// Setup problems are reported by [`crate::ModelBuilder::build`] before any
/// evaluation can run; the other two variants can only occur inside
/// [`crate::Model::evaluate`]. All of them are fatal for the call that
/// produced them; nothing is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent setup data, e.g. missing frame anchors,
    /// asymmetric covalent maps or non-finite parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The mutual induced-dipole iteration did not reach the target
    /// epsilon within the iteration ceiling. No energy or forces are
    /// returned from an unconverged state.
    #[error("induced dipoles failed to converge within {iterations} iterations (rms change {rms:.3e})")]
    Convergence { iterations: usize, rms: f64 },

    /// Two particles are close enough that the interaction tensors are
    /// singular. This is reported rather than clamped.
    #[error("particles {i} and {j} nearly coincide (separation {distance:.3e} nm)")]
    NumericalDomain { i: usize, j: usize, distance: f64 },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}
