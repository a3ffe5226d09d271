//! Episode/step driving loop.
//!
//! Every episode restarts from a fully extended chain and lets the agent
//! fold it for a fixed number of steps. The reward of a step is the drop in
//! oracle score it produced.

use burn::{config::Config, tensor::backend::AutodiffBackend};
use log::{debug, info, trace};

use crate::{
    algo::{DDPGAgent, DDPGAgentConfig},
    env::ScoringOracle,
    error::Error,
    memory::{ReplayBuffer, Transition},
    protein::{OracleConfig, ProteinState},
};

/// Top-level run configuration
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// RCSB identifier of the goal structure
    #[config(default = "String::from(\"2jof\")")]
    pub pdb_id: String,
    #[config(default = 10000)]
    pub episodes: usize,
    /// Steps per episode
    #[config(default = 500)]
    pub steps: usize,
    #[config(default = 10000)]
    pub buffer_capacity: usize,
    #[config(default = 0.0)]
    pub action_low: f32,
    #[config(default = 360.0)]
    pub action_high: f32,
    /// Angle every torsion starts from at the beginning of an episode
    #[config(default = 180.0)]
    pub initial_angle: f32,
    /// Reset the exploration noise at each episode start
    #[config(default = false)]
    pub reset_noise_each_episode: bool,
    #[config(default = "DDPGAgentConfig::new()")]
    pub agent: DDPGAgentConfig,
    #[config(default = "OracleConfig::new()")]
    pub oracle: OracleConfig,
    /// Seeds the replay buffer, and the agent unless it has its own seed
    #[config(default = "None")]
    pub seed: Option<u64>,
}

/// Outcome of one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub steps: usize,
    /// Sum of per-step rewards
    pub total_reward: f32,
    /// RMS angular distance between the last state and the goal
    pub final_distance: f32,
}

pub struct Trainer<B: AutodiffBackend, O: ScoringOracle> {
    agent: DDPGAgent<B>,
    buffer: ReplayBuffer,
    oracle: O,
    goal: ProteinState,
    config: TrainingConfig,
}

impl<B: AutodiffBackend, O: ScoringOracle> Trainer<B, O> {
    /// Size the agent after `goal`: state and action width are both
    /// `2 * n_residues`.
    pub fn new(
        config: TrainingConfig,
        goal: ProteinState,
        oracle: O,
        device: &B::Device,
    ) -> crate::Result<Self> {
        if goal.n_residues() == 0 {
            return Err(Error::InvalidConfig("goal structure has no residues".into()));
        }
        let dim = 2 * goal.n_residues();

        let mut agent_config = config.agent.clone();
        if agent_config.seed.is_none() {
            agent_config.seed = config.seed;
        }
        let agent = DDPGAgent::new(
            dim,
            dim,
            (config.action_low, config.action_high),
            agent_config,
            device,
        )?;
        let buffer = match config.seed {
            Some(seed) => ReplayBuffer::seeded(config.buffer_capacity, seed)?,
            None => ReplayBuffer::new(config.buffer_capacity)?,
        };

        info!(
            "training on {} residues: {} episodes x {} steps",
            goal.n_residues(),
            config.episodes,
            config.steps
        );

        Ok(Self {
            agent,
            buffer,
            oracle,
            goal,
            config,
        })
    }

    /// Run every configured episode. Stops at the first error.
    pub fn run(&mut self) -> crate::Result<Vec<EpisodeSummary>> {
        (0..self.config.episodes)
            .map(|episode| self.run_episode(episode))
            .collect()
    }

    pub fn run_episode(&mut self, episode: usize) -> crate::Result<EpisodeSummary> {
        if self.config.reset_noise_each_episode {
            self.agent.reset_noise();
        }

        let mut state = ProteinState::filled(self.goal.n_residues(), self.config.initial_angle)?;
        // Each step's next-state score is the following step's current score
        let mut score = state.eval_state(&self.oracle)?;
        let mut total_reward = 0.0;

        for step in 0..self.config.steps {
            let action = self.agent.select_action(&state)?;
            let next_state = state.do_action(&action)?;
            let next_score = next_state.eval_state(&self.oracle)?;
            let reward = (score - next_score) as f32;

            self.buffer
                .append(Transition::from_step(&state, &action, reward, &next_state))?;
            if let Some(metrics) = self.agent.learn(&mut self.buffer)? {
                trace!(
                    "critic_loss={:.6} actor_loss={:.6}",
                    metrics.critic_loss,
                    metrics.actor_loss
                );
            }

            debug!(
                "episode {episode} step {step}: distance={:.3} reward={reward:.4}",
                state.l2_norm(&self.goal)
            );

            total_reward += reward;
            state = next_state;
            score = next_score;
        }

        let summary = EpisodeSummary {
            episode,
            steps: self.config.steps,
            total_reward,
            final_distance: state.l2_norm(&self.goal),
        };
        info!(
            "episode {}: total_reward={:.4} distance={:.3}",
            summary.episode, summary.total_reward, summary.final_distance
        );
        Ok(summary)
    }

    pub fn agent(&self) -> &DDPGAgent<B> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DDPGAgent<B> {
        &mut self.agent
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn goal(&self) -> &ProteinState {
        &self.goal
    }
}
