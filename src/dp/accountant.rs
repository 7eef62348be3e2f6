//! Noise-scale calibration for the Gaussian and Laplace mechanisms.
//!
//! Pure functions mapping a privacy budget and the run shape (epochs,
//! batch size, dataset size) to a noise standard deviation, one formula
//! per composition theorem. The formulas are distinct calibrations of
//! the same mechanism and are not interchangeable.

use serde::{Deserialize, Serialize};

use super::budget::PrivacyBudget;
use super::error::{DpError, Result};

/// Privacy accounting method for gradient perturbation
///
/// Selects which composition theorem calibrates the per-step Gaussian
/// noise. Unknown tags are rejected at configuration time; there is no
/// silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountingMethod {
    /// Advanced composition (Dwork et al.)
    AdvancedComposition,
    /// Zero-concentrated differential privacy (Bun & Steinke)
    Zcdp,
    /// Renyi differential privacy (Mironov)
    Rdp,
    /// Naive (basic) composition
    NaiveDp,
}

impl AccountingMethod {
    /// Parse a command-line tag into an accounting method
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "adv_cmp" => Ok(Self::AdvancedComposition),
            "zcdp" => Ok(Self::Zcdp),
            "rdp" => Ok(Self::Rdp),
            "dp" => Ok(Self::NaiveDp),
            other => Err(DpError::UnknownMethod(other.to_string())),
        }
    }

    /// The command-line tag for this method
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AdvancedComposition => "adv_cmp",
            Self::Zcdp => "zcdp",
            Self::Rdp => "rdp",
            Self::NaiveDp => "dp",
        }
    }
}

/// Shape of a training run, as it enters the accounting formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunShape {
    /// Number of passes over the training data
    pub epochs: usize,
    /// Minibatch size (after clamping to the dataset size)
    pub batch_size: usize,
    /// Number of training examples
    pub n: usize,
}

impl RunShape {
    /// Create a new run shape
    pub fn new(epochs: usize, batch_size: usize, n: usize) -> Self {
        Self { epochs, batch_size, n }
    }

    /// Sampling ratio q = batch_size / n
    pub fn sampling_ratio(&self) -> f64 {
        self.batch_size as f64 / self.n as f64
    }

    /// Total step count T = epochs * n / batch_size
    pub fn step_count(&self) -> f64 {
        self.epochs as f64 * self.n as f64 / self.batch_size as f64
    }

    fn validate(&self) -> Result<()> {
        if self.epochs == 0 || self.batch_size == 0 || self.n == 0 {
            return Err(DpError::InvalidRunShape(format!(
                "epochs, batch_size and n must be positive, got {self:?}"
            )));
        }
        Ok(())
    }
}

/// Gaussian noise standard deviation multiplier for gradient perturbation
///
/// Each method reproduces its composition theorem's calibration exactly;
/// which of epsilon, delta, epochs, batch size and n enters the formula
/// differs per method.
pub fn noise_scale(
    method: AccountingMethod,
    budget: PrivacyBudget,
    shape: RunShape,
) -> Result<f64> {
    budget.validate()?;
    shape.validate()?;

    let epsilon = budget.epsilon;
    let delta = budget.delta;
    let epochs = shape.epochs as f64;

    let sigma = match method {
        AccountingMethod::AdvancedComposition => {
            (2.0 * epochs * (2.5 * epochs / delta).ln()).sqrt()
                * (((2.0 / delta).ln() + 2.0 * epsilon).sqrt() + (2.0 / delta).ln().sqrt())
                / epsilon
        }
        AccountingMethod::Zcdp => {
            (epochs / 2.0).sqrt()
                * (((1.0 / delta).ln() + epsilon).sqrt() + (1.0 / delta).ln().sqrt())
                / epsilon
        }
        AccountingMethod::Rdp => {
            let q = shape.sampling_ratio();
            let t = shape.step_count();
            q * (t * (2.0 * (1.0 / delta).ln() + epsilon)).sqrt() / epsilon
        }
        AccountingMethod::NaiveDp => {
            epochs * (2.0 * (1.25 * epochs / delta).ln()).sqrt() / epsilon
        }
    };

    Ok(sigma)
}

/// Calibration for objective perturbation
///
/// Two-case split on epsilon2 = epsilon - 2 ln(1 + 1/(4 n lambda)): when
/// the residual budget is positive no extra regularization is needed;
/// otherwise an additional L2 term delta_reg restores it and half the
/// budget is spent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveCalibration {
    /// Additional L2 regularization folded into the objective
    pub delta_reg: f64,
    /// Residual budget after the regularization accounting
    pub epsilon2: f64,
    /// Per-parameter Laplace noise scale 2/epsilon2 (divided by n at draw time)
    pub scale: f64,
}

impl ObjectiveCalibration {
    /// Calibrate objective perturbation for (epsilon, l2_ratio, n)
    pub fn calibrate(epsilon: f64, l2_ratio: f64, n: usize) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(DpError::InvalidBudget(format!(
                "epsilon must be positive, got {epsilon}"
            )));
        }
        if n == 0 {
            return Err(DpError::InvalidRunShape("n must be positive".to_string()));
        }

        let n = n as f64;
        let mut epsilon2 = epsilon - 2.0 * (1.0 + 1.0 / (4.0 * n * l2_ratio)).ln();
        let delta_reg = if epsilon2 > 0.0 {
            0.0
        } else {
            epsilon2 = epsilon / 2.0;
            1.0 / (4.0 * n * ((epsilon / 4.0).exp() - 1.0)) - l2_ratio
        };

        Ok(Self { delta_reg, epsilon2, scale: 2.0 / epsilon2 })
    }
}

/// Laplace noise scale for output perturbation: 2/(lambda * epsilon)
///
/// Divided by n when the draw is added to the final parameters.
pub fn output_noise_scale(l2_ratio: f64, epsilon: f64) -> Result<f64> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(DpError::InvalidBudget(format!(
            "epsilon must be positive, got {epsilon}"
        )));
    }
    if !l2_ratio.is_finite() || l2_ratio <= 0.0 {
        return Err(DpError::InvalidBudget(format!(
            "l2_ratio must be positive, got {l2_ratio}"
        )));
    }
    Ok(2.0 / (l2_ratio * epsilon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL_METHODS: [AccountingMethod; 4] = [
        AccountingMethod::AdvancedComposition,
        AccountingMethod::Zcdp,
        AccountingMethod::Rdp,
        AccountingMethod::NaiveDp,
    ];

    #[test]
    fn test_from_tag_roundtrip() {
        for method in ALL_METHODS {
            assert_eq!(AccountingMethod::from_tag(method.tag()).unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        assert!(matches!(
            AccountingMethod::from_tag("renyi"),
            Err(DpError::UnknownMethod(_))
        ));
        assert!(AccountingMethod::from_tag("").is_err());
    }

    #[test]
    fn test_noise_scale_is_pure() {
        let budget = PrivacyBudget::new(0.5, 1e-5);
        let shape = RunShape::new(100, 100, 10_000);
        for method in ALL_METHODS {
            let a = noise_scale(method, budget, shape).unwrap();
            let b = noise_scale(method, budget, shape).unwrap();
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_noise_scale_strictly_positive() {
        let budget = PrivacyBudget::new(2.0, 1e-6);
        let shape = RunShape::new(10, 64, 5_000);
        for method in ALL_METHODS {
            let sigma = noise_scale(method, budget, shape).unwrap();
            assert!(sigma > 0.0, "{method:?} produced sigma {sigma}");
        }
    }

    #[test]
    fn test_noise_scale_decreases_with_epsilon() {
        let shape = RunShape::new(50, 100, 10_000);
        for method in ALL_METHODS {
            let loose = noise_scale(method, PrivacyBudget::new(8.0, 1e-5), shape).unwrap();
            let tight = noise_scale(method, PrivacyBudget::new(0.1, 1e-5), shape).unwrap();
            assert!(tight > loose, "{method:?}: tighter budget must add more noise");
        }
    }

    #[test]
    fn test_advanced_composition_closed_form() {
        let budget = PrivacyBudget::new(0.5, 1e-5);
        let shape = RunShape::new(100, 100, 10_000);
        let sigma = noise_scale(AccountingMethod::AdvancedComposition, budget, shape).unwrap();
        let expected = (2.0_f64 * 100.0 * (2.5_f64 * 100.0 / 1e-5).ln()).sqrt()
            * (((2.0_f64 / 1e-5).ln() + 1.0).sqrt() + (2.0_f64 / 1e-5).ln().sqrt())
            / 0.5;
        assert_relative_eq!(sigma, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_zcdp_closed_form() {
        let budget = PrivacyBudget::new(1.0, 1e-5);
        let shape = RunShape::new(8, 100, 10_000);
        let sigma = noise_scale(AccountingMethod::Zcdp, budget, shape).unwrap();
        let expected =
            2.0_f64 * (((1e5_f64).ln() + 1.0).sqrt() + (1e5_f64).ln().sqrt());
        assert_relative_eq!(sigma, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_rdp_uses_sampling_ratio_and_step_count() {
        let budget = PrivacyBudget::new(1.0, 1e-5);
        let shape = RunShape::new(10, 100, 10_000);
        // q = 0.01, T = 1000
        let sigma = noise_scale(AccountingMethod::Rdp, budget, shape).unwrap();
        let expected = 0.01 * (1000.0_f64 * (2.0 * (1e5_f64).ln() + 1.0)).sqrt();
        assert_relative_eq!(sigma, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_naive_dp_closed_form() {
        let budget = PrivacyBudget::new(2.0, 1e-5);
        let shape = RunShape::new(10, 100, 10_000);
        let sigma = noise_scale(AccountingMethod::NaiveDp, budget, shape).unwrap();
        let expected = 10.0 * (2.0 * (1.25_f64 * 10.0 / 1e-5).ln()).sqrt() / 2.0;
        assert_relative_eq!(sigma, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_noise_scale_rejects_bad_budget() {
        let shape = RunShape::new(10, 100, 1000);
        assert!(noise_scale(AccountingMethod::Zcdp, PrivacyBudget::new(0.0, 1e-5), shape).is_err());
        assert!(noise_scale(AccountingMethod::Zcdp, PrivacyBudget::new(1.0, 1.5), shape).is_err());
    }

    #[test]
    fn test_noise_scale_rejects_degenerate_shape() {
        let budget = PrivacyBudget::new(1.0, 1e-5);
        assert!(noise_scale(AccountingMethod::Rdp, budget, RunShape::new(0, 100, 1000)).is_err());
        assert!(noise_scale(AccountingMethod::Rdp, budget, RunShape::new(10, 0, 1000)).is_err());
        assert!(noise_scale(AccountingMethod::Rdp, budget, RunShape::new(10, 100, 0)).is_err());
    }

    #[test]
    fn test_objective_calibration_fallback_branch() {
        // epsilon2 = 0.5 - 2 ln(1 + 2500) < 0, so the fallback fires.
        let cal = ObjectiveCalibration::calibrate(0.5, 1e-7, 1000).unwrap();
        assert_relative_eq!(cal.epsilon2, 0.25, max_relative = 1e-12);
        let expected_delta =
            1.0 / (4.0 * 1000.0 * ((0.5_f64 / 4.0).exp() - 1.0)) - 1e-7;
        assert_relative_eq!(cal.delta_reg, expected_delta, max_relative = 1e-12);
        assert_relative_eq!(cal.scale, 8.0, max_relative = 1e-12);
    }

    #[test]
    fn test_objective_calibration_direct_branch() {
        // With a large l2 ratio the residual budget stays positive.
        let cal = ObjectiveCalibration::calibrate(0.5, 1.0, 1000).unwrap();
        assert_eq!(cal.delta_reg, 0.0);
        let expected = 0.5 - 2.0 * (1.0 + 1.0 / 4000.0_f64).ln();
        assert_relative_eq!(cal.epsilon2, expected, max_relative = 1e-12);
        assert!(cal.epsilon2 > 0.0);
    }

    #[test]
    fn test_output_noise_scale() {
        let scale = output_noise_scale(1e-7, 0.5).unwrap();
        assert_relative_eq!(scale, 2.0 / (1e-7 * 0.5), max_relative = 1e-12);
        assert!(output_noise_scale(0.0, 0.5).is_err());
        assert!(output_noise_scale(1e-7, 0.0).is_err());
    }
}
