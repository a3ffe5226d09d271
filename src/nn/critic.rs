//! Action-value network with separate state and action streams.

use burn::{
    module::Module,
    nn::Linear,
    prelude::*,
    tensor::activation::relu,
};

use crate::nn::{
    init::{epsilon_linear, fan_in_linear},
    target::LayerRegistry,
};

/// Configuration for the critic network
#[derive(Config, Debug)]
pub struct CriticConfig {
    pub state_dim: usize,
    pub action_dim: usize,
    /// Output-layer weights are drawn from `[-epsilon, epsilon]`
    #[config(default = 0.003)]
    pub epsilon: f64,
}

/// Q(s, a) estimator.
///
/// ```text
/// state  → s_fc1 (400, ReLU) → s_fc2 (300, ReLU) ┐
///                                                 ├ concat (600) → fc3 (200, ReLU) → fc4 (1)
/// action → a_fc2 (300, ReLU) ─────────────────────┘
/// ```
#[derive(Module, Debug)]
pub struct Critic<B: Backend> {
    s_fc1: Linear<B>,
    s_fc2: Linear<B>,
    a_fc2: Linear<B>,
    fc3: Linear<B>,
    fc4: Linear<B>,
}

impl CriticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Critic<B> {
        Critic {
            s_fc1: fan_in_linear(self.state_dim, 400, device),
            s_fc2: fan_in_linear(400, 300, device),
            a_fc2: fan_in_linear(self.action_dim, 300, device),
            fc3: fan_in_linear(600, 200, device),
            fc4: epsilon_linear(200, 1, self.epsilon, device),
        }
    }
}

impl<B: Backend> Critic<B> {
    /// `[batch, state_dim]`, `[batch, action_dim]` → `[batch, 1]`
    pub fn forward(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> Tensor<B, 2> {
        let s = relu(self.s_fc1.forward(state));
        let s = relu(self.s_fc2.forward(s));

        let a = relu(self.a_fc2.forward(action));

        let x = Tensor::cat(vec![s, a], 1);
        let x = relu(self.fc3.forward(x));
        self.fc4.forward(x)
    }
}

impl<B: Backend> LayerRegistry<B> for Critic<B> {
    fn layers(&self) -> Vec<(&'static str, &Linear<B>)> {
        vec![
            ("s_fc1", &self.s_fc1),
            ("s_fc2", &self.s_fc2),
            ("a_fc2", &self.a_fc2),
            ("fc3", &self.fc3),
            ("fc4", &self.fc4),
        ]
    }

    fn layers_mut(&mut self) -> Vec<(&'static str, &mut Linear<B>)> {
        vec![
            ("s_fc1", &mut self.s_fc1),
            ("s_fc2", &mut self.s_fc2),
            ("a_fc2", &mut self.a_fc2),
            ("fc3", &mut self.fc3),
            ("fc4", &mut self.fc4),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::tensor::Distribution;

    #[test]
    fn test_forward_shape() {
        let device = NdArrayDevice::default();
        let critic = CriticConfig::new(6, 4).init::<NdArray>(&device);

        let state = Tensor::<NdArray, 2>::random([5, 6], Distribution::Uniform(0.0, 360.0), &device);
        let action = Tensor::<NdArray, 2>::random([5, 4], Distribution::Uniform(0.0, 360.0), &device);

        assert_eq!(critic.forward(state, action).dims(), [5, 1]);
    }

    #[test]
    fn test_is_deterministic() {
        let device = NdArrayDevice::default();
        let critic = CriticConfig::new(3, 3).init::<NdArray>(&device);

        let state = Tensor::<NdArray, 2>::random([2, 3], Distribution::Default, &device);
        let action = Tensor::<NdArray, 2>::random([2, 3], Distribution::Default, &device);

        let a = critic.forward(state.clone(), action.clone()).into_data();
        let b = critic.forward(state, action).into_data();
        assert_eq!(a.as_slice::<f32>().unwrap(), b.as_slice::<f32>().unwrap());
    }

    #[test]
    fn test_registry_lists_every_layer_in_order() {
        let device = NdArrayDevice::default();
        let critic = CriticConfig::new(3, 2).init::<NdArray>(&device);
        let names: Vec<_> = critic.layers().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["s_fc1", "s_fc2", "a_fc2", "fc3", "fc4"]);
        assert_eq!(critic.layers()[2].1.weight.val().dims(), [2, 300]);
    }
}
