//! Metrics reported by a single learning update.

/// Training metrics returned after each training update
///
/// These allow monitoring progress and spotting divergence of either
/// approximator.
#[derive(Clone, Debug, Default)]
pub struct TrainingMetrics {
    /// Actor loss: negative summed critic value of the actor's own actions
    pub actor_loss: f32,

    /// Critic loss: mean squared TD error
    pub critic_loss: f32,

    /// Rows actually sampled from the replay buffer
    pub batch_size: usize,

    /// Number of gradient updates performed so far by the agent
    pub n_updates: usize,
}

impl TrainingMetrics {
    pub fn new(actor_loss: f32, critic_loss: f32, batch_size: usize) -> Self {
        Self {
            actor_loss,
            critic_loss,
            batch_size,
            ..Default::default()
        }
    }
}
