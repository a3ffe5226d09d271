//! Backbone torsion angle matrix.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

/// Full turn in degrees. Every angle is periodic with this period.
pub const FULL_TURN: f32 = 360.0;

/// Wrap a single angle into `[0, 360)`.
#[inline]
pub fn wrap_degrees(value: f32) -> f32 {
    let wrapped = value.rem_euclid(FULL_TURN);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= FULL_TURN {
        0.0
    } else {
        wrapped
    }
}

/// Two-row matrix of backbone dihedrals in degrees.
///
/// Row 0 holds phi, row 1 holds psi, one column per residue. Storage is
/// row-major, so [`Angles::flatten`] yields every phi followed by every psi,
/// which is the layout of a state vector.
///
/// Equality is exact elementwise comparison and hashing agrees with it.
/// All values are finite by construction.
#[derive(Debug, Clone)]
pub struct Angles {
    n_residues: usize,
    data: Vec<f32>,
}

impl Angles {
    /// Build from separate phi and psi rows.
    pub fn new(phi: Vec<f32>, psi: Vec<f32>) -> Result<Self> {
        if phi.len() != psi.len() {
            return Err(Error::shape("psi row", &[phi.len()], &[psi.len()]));
        }
        let n_residues = phi.len();
        let mut data = phi;
        data.extend(psi);
        Self::checked(n_residues, data)
    }

    /// Matrix with every angle set to `value`.
    pub fn filled(n_residues: usize, value: f32) -> Result<Self> {
        Self::checked(n_residues, vec![value; 2 * n_residues])
    }

    /// Rebuild a matrix from its flattened form.
    pub fn from_flat(n_residues: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != 2 * n_residues {
            return Err(Error::shape("angle matrix", &[2, n_residues], &[data.len()]));
        }
        Self::checked(n_residues, data)
    }

    fn checked(n_residues: usize, data: Vec<f32>) -> Result<Self> {
        if let Some(bad) = data.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFinite(format!("angle matrix at flat index {bad}")));
        }
        Ok(Self { n_residues, data })
    }

    /// `[2, n_residues]`
    pub fn shape(&self) -> [usize; 2] {
        [2, self.n_residues]
    }

    pub fn n_residues(&self) -> usize {
        self.n_residues
    }

    pub fn phi(&self) -> &[f32] {
        &self.data[..self.n_residues]
    }

    pub fn psi(&self) -> &[f32] {
        &self.data[self.n_residues..]
    }

    /// Row-major view: all phi, then all psi.
    pub fn flatten(&self) -> &[f32] {
        &self.data
    }

    /// Copy with every angle wrapped into `[0, 360)`.
    pub fn wrapped(&self) -> Self {
        Self {
            n_residues: self.n_residues,
            data: self.data.iter().map(|&v| wrap_degrees(v)).collect(),
        }
    }

    /// Elementwise sum, requiring identical shapes.
    pub fn add(&self, other: &Angles) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::shape("angle addition", &self.shape(), &other.shape()));
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a + b)
            .collect();
        Self::checked(self.n_residues, data)
    }

    /// Iterate `(phi, psi)` pairs residue by residue.
    pub fn residues(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.phi().iter().copied().zip(self.psi().iter().copied())
    }
}

impl PartialEq for Angles {
    fn eq(&self, other: &Self) -> bool {
        self.n_residues == other.n_residues && self.data == other.data
    }
}

// Values are finite, so float equality is reflexive here.
impl Eq for Angles {}

impl Hash for Angles {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.n_residues.hash(state);
        for value in &self.data {
            // +0.0 folds -0.0 onto 0.0 so equal matrices hash equally
            (value + 0.0).to_bits().hash(state);
        }
    }
}

/// `phi psi` for each residue, all on one line.
impl fmt::Display for Angles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (phi, psi) in self.residues() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{phi} {psi}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(angles: &Angles) -> u64 {
        let mut hasher = DefaultHasher::new();
        angles.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_flatten_is_phi_then_psi() {
        let angles = Angles::new(vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]).unwrap();
        assert_eq!(angles.shape(), [2, 3]);
        assert_eq!(angles.flatten(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(angles.phi(), &[1.0, 2.0, 3.0]);
        assert_eq!(angles.psi(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        assert!(matches!(
            Angles::new(vec![1.0, 2.0], vec![3.0]),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(Angles::from_flat(3, vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(matches!(
            Angles::new(vec![f32::NAN], vec![0.0]),
            Err(Error::NonFinite(_))
        ));
        assert!(Angles::filled(2, f32::INFINITY).is_err());
    }

    #[test]
    fn test_wrapped_into_half_open_turn() {
        let angles = Angles::new(vec![-90.0, 360.0, 725.0], vec![0.0, 359.5, -720.0]).unwrap();
        let wrapped = angles.wrapped();
        assert_eq!(wrapped.phi(), &[270.0, 0.0, 5.0]);
        assert_eq!(wrapped.psi(), &[0.0, 359.5, 0.0]);
        assert!(wrapped.flatten().iter().all(|&v| (0.0..FULL_TURN).contains(&v)));
        assert!(wrap_degrees(-1e-9) < FULL_TURN);
    }

    #[test]
    fn test_exact_equality_and_hash() {
        let a = Angles::new(vec![0.0, 10.0], vec![20.0, 30.0]).unwrap();
        let b = Angles::new(vec![-0.0, 10.0], vec![20.0, 30.0]).unwrap();
        let c = Angles::new(vec![0.0, 10.0], vec![20.0, 30.000002]).unwrap();

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn test_display_pairs_residues() {
        let angles = Angles::new(vec![1.5, 2.0], vec![3.0, 4.25]).unwrap();
        assert_eq!(angles.to_string(), "1.5 3 2 4.25");
    }
}
