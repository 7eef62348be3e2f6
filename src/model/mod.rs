//! Model-adapter boundary
//!
//! The trainer treats a model as an opaque trainable parameter vector
//! plus a gradient oracle. Two concrete adapters live here: a linear
//! softmax regression and a two-hidden-layer feed-forward network, both
//! with closed-form backpropagation. Anything differentiable can sit
//! behind the trait.

mod mlp;
mod softmax;

pub use mlp::MlpModel;
pub use softmax::SoftmaxModel;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::dp::{DpError, Result as DpResult};
use crate::optim::UpdateRule;

/// A differentiable classifier exposing its parameters and a gradient oracle
///
/// Parameters are an ordered list of flat tensors, owned exclusively by
/// the model; the trainer mutates them only by applying update rules or
/// the output-perturbation pass.
pub trait Model {
    /// Ordered list of parameter tensors
    fn params(&self) -> &[Array1<f32>];

    /// Mutable access for update application and output perturbation
    fn params_mut(&mut self) -> &mut [Array1<f32>];

    /// Replace every parameter with its post-step value from the rule
    fn apply_update(&mut self, rule: UpdateRule) {
        for (param, new_value) in self.params_mut().iter_mut().zip(rule) {
            *param = new_value;
        }
    }

    /// Class probabilities, one row per input example
    fn forward(&self, inputs: &Array2<f32>) -> Array2<f32>;

    /// Mean cross-entropy loss (plus L2 penalty on the weights) and the
    /// gradient of that loss for every parameter tensor
    fn loss_and_grads(
        &self,
        inputs: &Array2<f32>,
        targets: &[usize],
        l2_ratio: f32,
    ) -> (f32, Vec<Array1<f32>>);

    /// Number of output classes
    fn n_classes(&self) -> usize;
}

/// Which classifier architecture to train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Two-hidden-layer feed-forward network
    Nn,
    /// Linear softmax regression
    Softmax,
}

impl ModelKind {
    /// Parse a command-line tag into a model kind
    pub fn from_tag(tag: &str) -> DpResult<Self> {
        match tag {
            "nn" => Ok(Self::Nn),
            "softmax" => Ok(Self::Softmax),
            other => Err(DpError::UnknownMode(other.to_string())),
        }
    }
}

/// Hidden-layer nonlinearity for the feed-forward network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nonlinearity {
    Tanh,
    Relu,
}

impl Nonlinearity {
    /// Parse a command-line tag into a nonlinearity
    pub fn from_tag(tag: &str) -> DpResult<Self> {
        match tag {
            "tanh" => Ok(Self::Tanh),
            "relu" => Ok(Self::Relu),
            other => Err(DpError::UnknownMode(other.to_string())),
        }
    }

    pub(crate) fn apply(&self, z: f32) -> f32 {
        match self {
            Self::Tanh => z.tanh(),
            Self::Relu => z.max(0.0),
        }
    }

    /// Derivative expressed in terms of the activation output
    pub(crate) fn derivative_from_output(&self, a: f32) -> f32 {
        match self {
            Self::Tanh => 1.0 - a * a,
            Self::Relu => {
                if a > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Row-wise softmax with max subtraction for stability
pub(crate) fn softmax_rows(logits: &mut Array2<f32>) {
    for mut row in logits.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|z| (z - max).exp());
        let sum: f32 = row.iter().sum();
        row.mapv_inplace(|p| p / sum);
    }
}

/// Mean negative log-likelihood of the target classes
pub(crate) fn cross_entropy(probs: &Array2<f32>, targets: &[usize]) -> f32 {
    let eps = 1e-12_f32;
    let total: f32 = targets
        .iter()
        .enumerate()
        .map(|(i, &t)| -(probs[[i, t]] + eps).ln())
        .sum();
    total / targets.len() as f32
}

/// Gradient of mean cross-entropy with respect to the logits:
/// (softmax - onehot) / batch_size
pub(crate) fn logit_gradient(probs: &Array2<f32>, targets: &[usize]) -> Array2<f32> {
    let batch = targets.len() as f32;
    let mut dlogits = probs / batch;
    for (i, &t) in targets.iter().enumerate() {
        dlogits[[i, t]] -= 1.0 / batch;
    }
    dlogits
}
