//! Neural network building blocks for the DDPG agent

pub mod actor;
pub mod critic;
pub mod init;
pub mod target;

pub use actor::{Actor, ActorConfig};
pub use critic::{Critic, CriticConfig};
pub use target::{flatten_params, update_target, LayerRegistry, TargetUpdate};
