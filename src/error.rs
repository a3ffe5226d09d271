//! Error types for the agent and its collaborators.

use thiserror::Error;

/// Crate-wide error type.
///
/// Every failure is surfaced to the caller; nothing in the crate retries or
/// swallows an error.
#[derive(Error, Debug)]
pub enum Error {
    /// Action bounds are empty or inverted
    #[error("invalid action bounds: high ({high}) must be greater than low ({low})")]
    InvalidBounds { low: f32, high: f32 },

    /// Two shapes that must agree do not
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Target and source approximators do not share a parameter layout
    #[error("parameter mismatch at layer '{layer}': {reason}")]
    ParamMismatch { layer: String, reason: String },

    /// A hyperparameter or capacity is outside its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// NaN or infinite value where a finite angle is required
    #[error("non-finite value in {0}")]
    NonFinite(String),

    /// The external scoring program failed or produced unusable output
    #[error("scoring oracle failed: {0}")]
    Oracle(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP {status} while fetching {url}")]
    Http { status: u16, url: String },

    /// Structure file could not be turned into backbone angles
    #[error("PDB error: {0}")]
    Pdb(String),

    /// Tensor data could not be read back
    #[error("tensor error: {0}")]
    Tensor(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn shape(context: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Error::ShapeMismatch {
            context,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub fn oracle(message: impl Into<String>) -> Self {
        Error::Oracle(message.into())
    }

    pub fn pdb(message: impl Into<String>) -> Self {
        Error::Pdb(message.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
