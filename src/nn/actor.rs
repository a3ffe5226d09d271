//! Deterministic policy network.

use burn::{
    module::Module,
    nn::Linear,
    prelude::*,
    tensor::activation::relu,
};

use crate::{
    error::Error,
    nn::{
        init::{epsilon_linear, fan_in_linear},
        target::LayerRegistry,
    },
};

/// Configuration for the actor network
#[derive(Config, Debug)]
pub struct ActorConfig {
    /// Width of the flattened state vector
    pub state_dim: usize,
    /// Width of the action vector
    pub action_dim: usize,
    /// `(low, high)` used to rescale the tanh output
    pub action_bounds: (f32, f32),
    /// Output-layer weights are drawn from `[-epsilon, epsilon]`
    #[config(default = 0.003)]
    pub epsilon: f64,
}

/// state → 400 (ReLU) → 300 (ReLU) → action_dim (tanh), then
/// `tanh(z) * (high - low) + (high + low) / 2`.
#[derive(Module, Debug)]
pub struct Actor<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    scale: f32,
    offset: f32,
}

pub const ACTOR_HIDDEN: [usize; 2] = [400, 300];

impl ActorConfig {
    /// Fails unless `high > low`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> crate::Result<Actor<B>> {
        let (low, high) = self.action_bounds;
        if !(high > low) {
            return Err(Error::InvalidBounds { low, high });
        }
        let [h1, h2] = ACTOR_HIDDEN;

        Ok(Actor {
            fc1: fan_in_linear(self.state_dim, h1, device),
            fc2: fan_in_linear(h1, h2, device),
            fc3: epsilon_linear(h2, self.action_dim, self.epsilon, device),
            scale: high - low,
            offset: (high + low) / 2.0,
        })
    }
}

impl<B: Backend> Actor<B> {
    /// `[batch, state_dim]` → `[batch, action_dim]`
    pub fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(state));
        let x = relu(self.fc2.forward(x));
        let x = self.fc3.forward(x).tanh();

        x.mul_scalar(self.scale).add_scalar(self.offset)
    }

    /// Rescale a unit-range value the same way the network output is rescaled.
    pub fn rescale(&self, value: f32) -> f32 {
        value * self.scale + self.offset
    }

    /// Range of values `forward` can produce: the tanh image under the rescale.
    pub fn output_range(&self) -> (f32, f32) {
        (self.offset - self.scale, self.offset + self.scale)
    }

    pub fn state_dim(&self) -> usize {
        self.fc1.weight.val().dims()[0]
    }

    pub fn action_dim(&self) -> usize {
        self.fc3.weight.val().dims()[1]
    }
}

impl<B: Backend> LayerRegistry<B> for Actor<B> {
    fn layers(&self) -> Vec<(&'static str, &Linear<B>)> {
        vec![("fc1", &self.fc1), ("fc2", &self.fc2), ("fc3", &self.fc3)]
    }

    fn layers_mut(&mut self) -> Vec<(&'static str, &mut Linear<B>)> {
        vec![
            ("fc1", &mut self.fc1),
            ("fc2", &mut self.fc2),
            ("fc3", &mut self.fc3),
        ]
    }
}
