//! Layer initializers.
//!
//! Each function builds one fully initialized `Linear` layer. Nothing is
//! mutated after construction.

use burn::{
    module::Param,
    nn::Linear,
    prelude::*,
    tensor::Distribution,
};

/// Output-layer weight range used by the actor and critic heads.
pub const DEFAULT_EPSILON: f64 = 0.003;

/// `1 / sqrt(fan_in)`
pub fn fan_in_bound(fan_in: usize) -> f64 {
    1.0 / (fan_in.max(1) as f64).sqrt()
}

fn uniform<B: Backend, const D: usize>(
    shape: [usize; D],
    bound: f64,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    Param::from_tensor(Tensor::random(
        shape,
        Distribution::Uniform(-bound, bound),
        device,
    ))
}

/// Hidden layer: weights and bias uniform in `[-1/sqrt(d_input), 1/sqrt(d_input)]`.
pub fn fan_in_linear<B: Backend>(d_input: usize, d_output: usize, device: &B::Device) -> Linear<B> {
    let bound = fan_in_bound(d_input);
    Linear {
        weight: uniform([d_input, d_output], bound, device),
        bias: Some(uniform([d_output], bound, device)),
    }
}

/// Output layer: weights uniform in `[-epsilon, epsilon]`, bias on the
/// usual fan-in range.
pub fn epsilon_linear<B: Backend>(
    d_input: usize,
    d_output: usize,
    epsilon: f64,
    device: &B::Device,
) -> Linear<B> {
    Linear {
        weight: uniform([d_input, d_output], epsilon, device),
        bias: Some(uniform([d_output], fan_in_bound(d_input), device)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    fn max_abs(linear: &Linear<NdArray>) -> f32 {
        linear
            .weight
            .val()
            .abs()
            .max()
            .into_scalar()
    }

    #[test]
    fn test_fan_in_linear_shape_and_range() {
        let device = NdArrayDevice::default();
        let layer = fan_in_linear::<NdArray>(400, 300, &device);

        assert_eq!(layer.weight.val().dims(), [400, 300]);
        assert_eq!(layer.bias.as_ref().unwrap().val().dims(), [300]);
        assert!(max_abs(&layer) <= fan_in_bound(400) as f32);
    }

    #[test]
    fn test_epsilon_linear_range() {
        let device = NdArrayDevice::default();
        let layer = epsilon_linear::<NdArray>(300, 4, DEFAULT_EPSILON, &device);

        assert_eq!(layer.weight.val().dims(), [300, 4]);
        assert!(max_abs(&layer) <= DEFAULT_EPSILON as f32);
    }

    #[test]
    fn test_fan_in_bound() {
        assert_eq!(fan_in_bound(4), 0.5);
        assert_eq!(fan_in_bound(0), 1.0);
    }
}
