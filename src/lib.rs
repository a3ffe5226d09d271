//! DDPG agent that learns to fold a protein backbone.
//!
//! The agent acts on the flattened phi/psi torsion angles of a chain, the
//! reward is the drop in an external oracle's score, and the learning core
//! (actor, critic, target networks, replay, exploration noise) is built on
//! burn.

pub mod algo;
pub mod env;
pub mod error;
pub mod memory;
pub mod noise;
pub mod nn;
pub mod protein;
pub mod traits;
pub mod train;

pub use error::{Error, Result};
