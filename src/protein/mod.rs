//! Protein conformations: torsion angle matrices, the state object the agent
//! acts on, structure retrieval, and external scoring.

pub mod angles;
pub mod oracle;
pub mod pdb;
pub mod state;

pub use angles::{wrap_degrees, Angles, FULL_TURN};
pub use oracle::{OracleConfig, RedcraftOracle};
pub use pdb::{fetch_protein, load_protein, parse_pdb};
pub use state::ProteinState;
