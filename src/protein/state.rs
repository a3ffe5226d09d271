use std::fmt;

use crate::{
    env::{Conformation, ScoringOracle},
    error::{Error, Result},
    protein::angles::Angles,
};

/// Angle assigned to every torsion of a freshly created chain.
pub const DEFAULT_ANGLE: f32 = 180.0;

/// Immutable protein conformation.
///
/// Angles are always stored wrapped into `[0, 360)`. Two states are equal
/// when their angle matrices are exactly equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProteinState {
    angles: Angles,
}

impl ProteinState {
    /// Fully extended chain: every phi and psi at 180 degrees.
    pub fn new(n_residues: usize) -> Result<Self> {
        Self::filled(n_residues, DEFAULT_ANGLE)
    }

    pub fn filled(n_residues: usize, angle: f32) -> Result<Self> {
        Ok(Self::from_angles(Angles::filled(n_residues, angle)?))
    }

    /// Wraps the given angles into `[0, 360)`.
    pub fn from_angles(angles: Angles) -> Self {
        Self {
            angles: angles.wrapped(),
        }
    }

    pub fn angles(&self) -> &Angles {
        &self.angles
    }

    pub fn n_residues(&self) -> usize {
        self.angles.n_residues()
    }

    /// Score this conformation with an external oracle.
    pub fn eval_state<O: ScoringOracle>(&self, oracle: &O) -> Result<f64> {
        oracle.score(&self.angles)
    }

    pub fn do_action(&self, action: &Angles) -> Result<Self> {
        if action.shape() != self.angles.shape() {
            return Err(Error::shape("action", &self.angles.shape(), &action.shape()));
        }
        Ok(Self::from_angles(self.angles.add(action)?))
    }

    pub fn l2_norm(&self, other: &ProteinState) -> f32 {
        let a = self.angles.flatten();
        let b = other.angles.flatten();
        if a.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
        (sum_sq / a.len() as f32).sqrt()
    }
}

impl Conformation for ProteinState {
    fn angles(&self) -> &Angles {
        ProteinState::angles(self)
    }

    fn do_action(&self, action: &Angles) -> Result<Self> {
        ProteinState::do_action(self, action)
    }

    fn l2_norm(&self, other: &Self) -> f32 {
        ProteinState::l2_norm(self, other)
    }
}

impl fmt::Display for ProteinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.angles, f)
    }
}
