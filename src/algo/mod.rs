/// Deep Deterministic Policy Gradient
pub mod ddpg;

pub use ddpg::{DDPGAgent, DDPGAgentConfig};
