//! Deep Deterministic Policy Gradient (DDPG)
//!
//! Off-policy actor-critic for continuous actions. The agent maintains:
//! - **Actor**: deterministic policy a = π(s)
//! - **Critic**: action-value estimate Q(s, a)
//! - **Target copies** of both, moved by Polyak averaging after each update
//! - **Ornstein–Uhlenbeck noise** added to the policy output while exploring
//!
//! The agent is driven by an external loop alternating two phases:
//! [`DDPGAgent::select_action`] and [`DDPGAgent::train_step`]. Both are plain
//! blocking calls.
//!
//! Actions are torsion-angle increments, so every action is folded back into
//! `[0, 360)` before it is returned.
//!
//! # Learning update
//!
//! ```text
//! y       = r + γ · Q′(s′, π′(s′))          (targets, no gradient)
//! L_Q     = mean((Q(s, a) − y)²)             (critic step)
//! L_π     = −Σ Q(s, π(s))                    (actor step, critic frozen)
//! θ′      ← τθ + (1 − τ)θ′                   (both targets)
//! ```
//!
//! The critic is stepped first and the actor loss is evaluated against the
//! freshly updated critic.
//!
//! Reference: "Continuous control with deep reinforcement learning" (Lillicrap et al., 2015)

use burn::{
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use log::{debug, trace};

use crate::{
    env::Conformation,
    error::Error,
    memory::{Batch, ReplayBuffer},
    nn::{update_target, Actor, ActorConfig, Critic, CriticConfig, TargetUpdate},
    noise::{OrnsteinUhlenbeck, OrnsteinUhlenbeckConfig},
    protein::{wrap_degrees, Angles},
    traits::{to_vec, ToTensor, TrainingMetrics},
};

/// Configuration for the DDPG agent
#[derive(Config, Debug)]
pub struct DDPGAgentConfig {
    /// Actor learning rate
    #[config(default = 1e-4)]
    pub actor_lr: f64,
    /// Critic learning rate
    #[config(default = 1e-3)]
    pub critic_lr: f64,
    /// Discount factor γ
    #[config(default = 0.99)]
    pub gamma: f32,
    /// Soft update coefficient τ
    #[config(default = 0.001)]
    pub tau: f32,
    /// Minibatch size requested from the replay buffer
    #[config(default = 100)]
    pub batch_size: usize,
    #[config(default = 0.0)]
    pub noise_mu: f32,
    #[config(default = 0.15)]
    pub noise_theta: f32,
    #[config(default = 0.2)]
    pub noise_sigma: f32,
    /// Output-layer init range for both networks
    #[config(default = 0.003)]
    pub epsilon: f64,
    /// Seeds the backend RNG (weight init) and the noise process
    #[config(default = "None")]
    pub seed: Option<u64>,
}

impl DDPGAgentConfig {
    fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.tau) {
            return Err(Error::InvalidConfig(format!("tau must be in [0, 1], got {}", self.tau)));
        }
        if !self.gamma.is_finite() {
            return Err(Error::InvalidConfig(format!("gamma must be finite, got {}", self.gamma)));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// DDPG agent over flattened angle vectors.
pub struct DDPGAgent<B: AutodiffBackend> {
    actor: Actor<B>,
    actor_target: Actor<B>,
    critic: Critic<B>,
    critic_target: Critic<B>,

    actor_optimizer: OptimizerAdaptor<Adam, Actor<B>, B>,
    critic_optimizer: OptimizerAdaptor<Adam, Critic<B>, B>,

    noise: OrnsteinUhlenbeck,
    device: B::Device,
    config: DDPGAgentConfig,

    eval_mode: bool,
    update_count: usize,
}

impl<B: AutodiffBackend> DDPGAgent<B> {
    /// Build the four networks and both optimizers.
    ///
    /// Targets are initialized independently and then overwritten with an
    /// exact copy of their live counterparts. Fails when
    /// `action_bounds.1 <= action_bounds.0` or the config is out of range.
    pub fn new(
        state_dim: usize,
        action_dim: usize,
        action_bounds: (f32, f32),
        config: DDPGAgentConfig,
        device: &B::Device,
    ) -> crate::Result<Self> {
        config.validate()?;
        if let Some(seed) = config.seed {
            B::seed(seed);
        }

        let actor_config =
            ActorConfig::new(state_dim, action_dim, action_bounds).with_epsilon(config.epsilon);
        let critic_config = CriticConfig::new(state_dim, action_dim).with_epsilon(config.epsilon);

        let actor = actor_config.init::<B>(device)?;
        let mut actor_target = actor_config.init::<B>(device)?;
        let critic = critic_config.init::<B>(device);
        let mut critic_target = critic_config.init::<B>(device);

        update_target(&mut actor_target, &actor, TargetUpdate::Hard)?;
        update_target(&mut critic_target, &critic, TargetUpdate::Hard)?;

        let noise = OrnsteinUhlenbeckConfig::new(action_dim)
            .with_mu(config.noise_mu)
            .with_theta(config.noise_theta)
            .with_sigma(config.noise_sigma)
            .with_seed(config.seed)
            .init();

        debug!(
            "ddpg agent: state_dim={state_dim} action_dim={action_dim} bounds={action_bounds:?}"
        );

        Ok(Self {
            actor,
            actor_target,
            critic,
            critic_target,
            actor_optimizer: AdamConfig::new().init(),
            critic_optimizer: AdamConfig::new().init(),
            noise,
            device: device.clone(),
            config,
            eval_mode: false,
            update_count: 0,
        })
    }

    /// Deterministic policy output for `state`, before noise and wrapping.
    pub fn act<S: Conformation>(&self, state: &S) -> crate::Result<Vec<f32>> {
        let flat = state.angles().flatten();
        let state_dim = self.actor.state_dim();
        if flat.len() != state_dim {
            return Err(Error::shape("state", &[state_dim], &[flat.len()]));
        }

        let input: Tensor<B, 2> = vec![flat.to_vec()].to_tensor(&self.device);
        to_vec(self.actor.forward(input))
    }

    /// Policy output plus rescaled exploration noise, folded into `[0, 360)`
    /// and laid out like the state's angle matrix.
    ///
    /// In eval mode no noise is drawn.
    pub fn select_action<S: Conformation>(&mut self, state: &S) -> crate::Result<Angles> {
        let action_dim = self.actor.action_dim();
        let state_len = state.angles().flatten().len();
        if action_dim != state_len {
            return Err(Error::shape("action", &[state_len], &[action_dim]));
        }

        let mut action = self.act(state)?;
        if !self.eval_mode {
            let noise = self.noise.sample();
            for (a, n) in action.iter_mut().zip(noise) {
                *a += self.actor.rescale(*n);
            }
        }
        for a in action.iter_mut() {
            *a = wrap_degrees(*a);
        }

        Angles::from_flat(state.n_residues(), action)
    }

    /// Sample `min(batch_size, buffer.len())` transitions and run one update.
    ///
    /// Returns `Ok(None)` when the buffer is empty.
    pub fn train_step(
        &mut self,
        buffer: &mut ReplayBuffer,
        batch_size: usize,
    ) -> crate::Result<Option<TrainingMetrics>> {
        let batch = buffer.sample(batch_size);
        self.train_on_batch(batch)
    }

    /// [`DDPGAgent::train_step`] with the configured batch size.
    pub fn learn(&mut self, buffer: &mut ReplayBuffer) -> crate::Result<Option<TrainingMetrics>> {
        self.train_step(buffer, self.config.batch_size)
    }

    /// Run one critic step, one actor step and both soft updates on an
    /// already sampled batch.
    pub fn train_on_batch(&mut self, batch: Batch) -> crate::Result<Option<TrainingMetrics>> {
        if batch.is_empty() {
            return Ok(None);
        }
        self.check_batch(&batch)?;

        let batch_size = batch.len();
        let states: Tensor<B, 2> = batch.states.to_tensor(&self.device);
        let actions: Tensor<B, 2> = batch.actions.to_tensor(&self.device);
        let rewards: Tensor<B, 1> = batch.rewards.to_tensor(&self.device);
        let next_states: Tensor<B, 2> = batch.next_states.to_tensor(&self.device);

        let critic_loss = self.update_critic(
            states.clone(),
            actions,
            rewards.reshape([batch_size, 1]),
            next_states,
        );
        let actor_loss = self.update_actor(states);

        let tau = TargetUpdate::Soft(self.config.tau);
        update_target(&mut self.actor_target, &self.actor, tau)?;
        update_target(&mut self.critic_target, &self.critic, tau)?;

        self.update_count += 1;
        debug!(
            "update {}: batch={batch_size} critic_loss={critic_loss:.6} actor_loss={actor_loss:.6}",
            self.update_count
        );

        let mut metrics = TrainingMetrics::new(actor_loss, critic_loss, batch_size);
        metrics.n_updates = self.update_count;
        Ok(Some(metrics))
    }

    fn check_batch(&self, batch: &Batch) -> crate::Result<()> {
        let state_dim = self.actor.state_dim();
        let action_dim = self.actor.action_dim();
        for (state, (action, next_state)) in batch
            .states
            .iter()
            .zip(batch.actions.iter().zip(&batch.next_states))
        {
            if state.len() != state_dim || next_state.len() != state_dim {
                return Err(Error::shape(
                    "batch state",
                    &[state_dim],
                    &[state.len().max(next_state.len())],
                ));
            }
            if action.len() != action_dim {
                return Err(Error::shape("batch action", &[action_dim], &[action.len()]));
            }
        }
        Ok(())
    }

    /// Regress Q(s, a) toward r + γ·Q′(s′, π′(s′)); returns the MSE.
    fn update_critic(
        &mut self,
        states: Tensor<B, 2>,
        actions: Tensor<B, 2>,
        rewards: Tensor<B, 2>,
        next_states: Tensor<B, 2>,
    ) -> f32 {
        let next_actions = self.actor_target.forward(next_states.clone()).detach();
        let q_next = self.critic_target.forward(next_states, next_actions).detach();
        let target = (rewards + q_next.mul_scalar(self.config.gamma)).detach();

        let q = self.critic.forward(states, actions);
        let loss = (q - target).powf_scalar(2.0).mean();
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.critic);
        self.critic = self
            .critic_optimizer
            .step(self.config.critic_lr, self.critic.clone(), grads);

        loss_value
    }

    /// Ascend Σ Q(s, π(s)) with respect to the actor only; returns the loss.
    fn update_actor(&mut self, states: Tensor<B, 2>) -> f32 {
        let predicted = self.actor.forward(states.clone());
        let loss = self.critic.forward(states, predicted).sum().neg();
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        // Gradients reach the critic's parameters too but only the actor's are applied
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.actor);
        self.actor = self
            .actor_optimizer
            .step(self.config.actor_lr, self.actor.clone(), grads);
        trace!("actor step applied");

        loss_value
    }

    /// Put the exploration noise back at its mean.
    pub fn reset_noise(&mut self) {
        self.noise.reset();
    }

    /// Switch to evaluation mode (no exploration noise)
    pub fn eval(&mut self) {
        self.eval_mode = true;
    }

    /// Switch to training mode (exploration noise enabled)
    pub fn train(&mut self) {
        self.eval_mode = false;
    }

    pub fn is_eval(&self) -> bool {
        self.eval_mode
    }

    pub fn config(&self) -> &DDPGAgentConfig {
        &self.config
    }

    pub fn update_count(&self) -> usize {
        self.update_count
    }

    pub fn actor(&self) -> &Actor<B> {
        &self.actor
    }

    pub fn actor_target(&self) -> &Actor<B> {
        &self.actor_target
    }

    pub fn critic(&self) -> &Critic<B> {
        &self.critic
    }

    pub fn critic_target(&self) -> &Critic<B> {
        &self.critic_target
    }
}
