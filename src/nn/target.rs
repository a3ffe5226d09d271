//! Target network maintenance.
//!
//! Target copies are never trained directly. They only move through
//! [`update_target`], either as an exact copy of their live counterpart or
//! by Polyak averaging: θ′ ← τθ + (1 − τ)θ′.

use burn::{
    module::Param,
    nn::Linear,
    prelude::*,
};
use log::trace;

use crate::{
    error::{Error, Result},
    traits::to_vec,
};

/// Soft update coefficient applied after every training step.
pub const DEFAULT_TAU: f32 = 0.001;

/// Ordered, named view of an approximator's linear layers.
///
/// Target updates pair layers by name and position, so both sides of an
/// update must list the same names in the same order.
pub trait LayerRegistry<B: Backend> {
    fn layers(&self) -> Vec<(&'static str, &Linear<B>)>;

    fn layers_mut(&mut self) -> Vec<(&'static str, &mut Linear<B>)>;
}

/// How a target approximator follows its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetUpdate {
    /// Replace every target parameter with the source value
    Hard,
    /// θ′ ← τθ + (1 − τ)θ′
    Soft(f32),
}

impl Default for TargetUpdate {
    fn default() -> Self {
        TargetUpdate::Soft(DEFAULT_TAU)
    }
}

/// Move `target` toward `source`.
///
/// Both registries are checked for matching names and parameter shapes
/// before anything is written; on mismatch the target is left untouched.
pub fn update_target<B, M>(target: &mut M, source: &M, update: TargetUpdate) -> Result<()>
where
    B: Backend,
    M: LayerRegistry<B>,
{
    if let TargetUpdate::Soft(tau) = update {
        if !(0.0..=1.0).contains(&tau) {
            return Err(Error::InvalidConfig(format!("tau must be in [0, 1], got {tau}")));
        }
    }

    let source_layers = source.layers();
    validate_layout(&target.layers(), &source_layers)?;

    let tau = match update {
        TargetUpdate::Hard => 1.0,
        TargetUpdate::Soft(tau) => tau,
    };
    if tau == 0.0 {
        return Ok(());
    }
    trace!("target update with tau = {tau}");

    for ((name, target_layer), (_, source_layer)) in target.layers_mut().into_iter().zip(source_layers) {
        trace!("updating layer {name}");
        soft_update_linear_inplace(target_layer, source_layer, tau);
    }
    Ok(())
}

fn validate_layout<B: Backend>(
    target: &[(&'static str, &Linear<B>)],
    source: &[(&'static str, &Linear<B>)],
) -> Result<()> {
    if target.len() != source.len() {
        return Err(Error::ParamMismatch {
            layer: "*".into(),
            reason: format!("target has {} layers, source has {}", target.len(), source.len()),
        });
    }

    for ((t_name, t), (s_name, s)) in target.iter().zip(source) {
        if t_name != s_name {
            return Err(Error::ParamMismatch {
                layer: (*t_name).into(),
                reason: format!("source layer at this position is '{s_name}'"),
            });
        }
        let (t_w, s_w) = (t.weight.val().dims(), s.weight.val().dims());
        if t_w != s_w {
            return Err(Error::ParamMismatch {
                layer: (*t_name).into(),
                reason: format!("weight shape {t_w:?} vs {s_w:?}"),
            });
        }
        let t_b = t.bias.as_ref().map(|b| b.val().dims());
        let s_b = s.bias.as_ref().map(|b| b.val().dims());
        if t_b != s_b {
            return Err(Error::ParamMismatch {
                layer: (*t_name).into(),
                reason: format!("bias shape {t_b:?} vs {s_b:?}"),
            });
        }
    }
    Ok(())
}

fn soft_update_tensor_inplace<B: Backend, const D: usize>(
    this: &mut Param<Tensor<B, D>>,
    that: &Param<Tensor<B, D>>,
    tau: f32,
) {
    // Detach both sides so no autodiff graph accumulates across updates
    let source = that.val().detach();
    *this = if tau == 1.0 {
        this.clone().map(|_| source.clone())
    } else {
        this.clone()
            .map(|tensor| tensor.detach() * (1.0 - tau) + source.clone() * tau)
    };
}

fn soft_update_linear_inplace<B: Backend>(this: &mut Linear<B>, that: &Linear<B>, tau: f32) {
    soft_update_tensor_inplace(&mut this.weight, &that.weight, tau);

    if let (Some(b1), Some(b2)) = (&mut this.bias, &that.bias) {
        soft_update_tensor_inplace(b1, b2, tau);
    }
}

/// Every parameter of `model` concatenated in registry order.
pub fn flatten_params<B: Backend, M: LayerRegistry<B>>(model: &M) -> Result<Vec<f32>> {
    let mut values = Vec::new();
    for (_, layer) in model.layers() {
        values.extend(to_vec(layer.weight.val())?);
        if let Some(bias) = &layer.bias {
            values.extend(to_vec(bias.val())?);
        }
    }
    Ok(values)
}
