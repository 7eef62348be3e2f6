//! Differential privacy core
//!
//! Noise-scale calibration (the accountant), the perturbation engine
//! that rewrites optimizer update rules, and the privacy budget type.
//!
//! Three mechanisms share this module:
//! - gradient perturbation: per-step clipping plus Gaussian noise,
//!   calibrated by one of four accounting methods
//! - objective perturbation: a fixed Laplace noise map folded into the
//!   objective before training starts
//! - output perturbation: one Laplace draw added to the final parameters
//!
//! # References
//!
//! Abadi et al. (2016) - Deep Learning with Differential Privacy
//! Mironov (2017) - Renyi Differential Privacy
//! Bun & Steinke (2016) - Concentrated Differential Privacy

pub mod accountant;
pub mod budget;
pub mod error;
pub mod perturb;

pub use accountant::{
    noise_scale, output_noise_scale, AccountingMethod, ObjectiveCalibration, RunShape,
};
pub use budget::PrivacyBudget;
pub use error::{DpError, Result};
pub use perturb::{
    clip_to_norm, gaussian_noise_like, laplace_noise_like, perturb_output, Perturbation,
};
