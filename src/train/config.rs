//! Training configuration.

use serde::{Deserialize, Serialize};

use crate::dp::{AccountingMethod, DpError, PrivacyBudget, Result as DpResult};
use crate::error::{Error, Result};
use crate::model::Nonlinearity;

/// Which privacy mechanism guards the training run
///
/// The three mechanisms are mutually exclusive; `NoPrivacy` is the
/// baseline with no noise anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyMode {
    /// No noise injected anywhere
    NoPrivacy,
    /// Objective perturbation: a fixed Laplace noise map folded into the
    /// objective before training starts
    ObjPert,
    /// Gradient perturbation: per-step clipping plus Gaussian noise
    GradPert,
    /// Output perturbation: one Laplace draw on the final parameters
    OutPert,
}

impl PrivacyMode {
    /// Parse a command-line tag into a privacy mode
    pub fn from_tag(tag: &str) -> DpResult<Self> {
        match tag {
            "no_privacy" => Ok(Self::NoPrivacy),
            "obj_pert" => Ok(Self::ObjPert),
            "grad_pert" => Ok(Self::GradPert),
            "out_pert" => Ok(Self::OutPert),
            other => Err(DpError::UnknownMode(other.to_string())),
        }
    }

    /// The command-line tag for this mode
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NoPrivacy => "no_privacy",
            Self::ObjPert => "obj_pert",
            Self::GradPert => "grad_pert",
            Self::OutPert => "out_pert",
        }
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Hidden-layer width for the feed-forward model
    pub n_hidden: usize,
    /// Minibatch size (clamped to the partition size at run time)
    pub batch_size: usize,
    /// Number of passes over the training data
    pub epochs: usize,
    /// Adam learning rate
    pub learning_rate: f32,
    /// L2 regularization ratio on the weight matrices
    pub l2_ratio: f32,
    /// L2 clipping bound C for gradient perturbation
    pub clip_bound: f64,
    /// Hidden-layer nonlinearity
    pub nonlinearity: Nonlinearity,
    /// Privacy mechanism
    pub privacy: PrivacyMode,
    /// Accounting method for gradient perturbation
    pub dp: AccountingMethod,
    /// Privacy budget (epsilon, delta)
    pub budget: PrivacyBudget,
    /// Suppress per-epoch progress output
    pub silent: bool,
}

impl TrainConfig {
    /// Create a configuration with the standard defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set hidden-layer width
    pub fn with_n_hidden(mut self, n_hidden: usize) -> Self {
        self.n_hidden = n_hidden;
        self
    }

    /// Set minibatch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set epoch count
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set L2 regularization ratio
    pub fn with_l2_ratio(mut self, l2_ratio: f32) -> Self {
        self.l2_ratio = l2_ratio;
        self
    }

    /// Set the gradient clipping bound
    pub fn with_clip_bound(mut self, clip_bound: f64) -> Self {
        self.clip_bound = clip_bound;
        self
    }

    /// Set hidden-layer nonlinearity
    pub fn with_nonlinearity(mut self, nonlinearity: Nonlinearity) -> Self {
        self.nonlinearity = nonlinearity;
        self
    }

    /// Set privacy mode
    pub fn with_privacy(mut self, privacy: PrivacyMode) -> Self {
        self.privacy = privacy;
        self
    }

    /// Set accounting method
    pub fn with_accounting(mut self, dp: AccountingMethod) -> Self {
        self.dp = dp;
        self
    }

    /// Set privacy budget
    pub fn with_budget(mut self, budget: PrivacyBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Set progress-output suppression
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Validate configuration invariants
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !self.l2_ratio.is_finite() || self.l2_ratio < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "l2_ratio must be non-negative, got {}",
                self.l2_ratio
            )));
        }
        if !self.clip_bound.is_finite() || self.clip_bound <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "clip_bound must be positive, got {}",
                self.clip_bound
            )));
        }
        if self.privacy != PrivacyMode::NoPrivacy {
            self.budget.validate()?;
        }
        Ok(())
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n_hidden: 50,
            batch_size: 100,
            epochs: 100,
            learning_rate: 0.01,
            l2_ratio: 1e-7,
            clip_bound: 1.0,
            nonlinearity: Nonlinearity::Relu,
            privacy: PrivacyMode::NoPrivacy,
            dp: AccountingMethod::NaiveDp,
            budget: PrivacyBudget::default(),
            silent: true,
        }
    }
}
