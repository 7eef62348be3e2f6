//! Privacy budget for a training run.

use serde::{Deserialize, Serialize};

use super::error::{DpError, Result};

/// Privacy budget (epsilon, delta)
///
/// Consumed once per training run to derive a noise scale; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrivacyBudget {
    /// Privacy loss parameter epsilon (smaller = more private)
    pub epsilon: f64,
    /// Probability of privacy breach delta (smaller = more private)
    pub delta: f64,
}

impl PrivacyBudget {
    /// Create a new privacy budget
    pub fn new(epsilon: f64, delta: f64) -> Self {
        Self { epsilon, delta }
    }

    /// Validate the budget invariants: epsilon > 0, delta in (0, 1)
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(DpError::InvalidBudget(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if !self.delta.is_finite() || self.delta <= 0.0 || self.delta >= 1.0 {
            return Err(DpError::InvalidBudget(format!(
                "delta must be in (0, 1), got {}",
                self.delta
            )));
        }
        Ok(())
    }
}

impl Default for PrivacyBudget {
    fn default() -> Self {
        Self { epsilon: 0.5, delta: 1e-5 }
    }
}
