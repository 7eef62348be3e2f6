//! Optimizers for training classifiers

mod adam;

pub use adam::Adam;

use ndarray::Array1;

/// A proposed post-step value for every parameter, index-aligned with
/// the model's parameter list
///
/// Produced by the optimizer, optionally rewritten by the perturbation
/// engine, and finally applied by the trainer. Rewriting never changes
/// the entry count or shapes.
pub type UpdateRule = Vec<Array1<f32>>;
