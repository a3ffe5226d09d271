//! Boundary between the learning core and the conformation it drives.
//!
//! The agent only needs to read a state's angle matrix; applying actions,
//! scoring and distance reporting belong to the environment side and are
//! expressed here as traits so the driving loop can be exercised without the
//! real scoring program.

use crate::{error::Result, protein::Angles};

/// A candidate conformation described by backbone torsion angles.
pub trait Conformation: Sized {
    /// Current angle matrix (phi row, psi row).
    fn angles(&self) -> &Angles;

    fn n_residues(&self) -> usize {
        self.angles().n_residues()
    }

    /// Apply an additive angle update and wrap the result into `[0, 360)`.
    ///
    /// Fails when `action` does not have the same shape as the angle matrix.
    fn do_action(&self, action: &Angles) -> Result<Self>;

    /// Root-mean-square angular difference to `other`. Progress reporting only.
    fn l2_norm(&self, other: &Self) -> f32;
}

/// External fitness evaluation of a full angle configuration.
///
/// Implementations must surface every failure; callers decide whether a
/// training run aborts.
pub trait ScoringOracle {
    fn score(&self, angles: &Angles) -> Result<f64>;
}

impl<O: ScoringOracle + ?Sized> ScoringOracle for &O {
    fn score(&self, angles: &Angles) -> Result<f64> {
        (**self).score(angles)
    }
}
