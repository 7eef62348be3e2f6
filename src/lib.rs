//! Privatizar: differentially private classifier training
//!
//! Trains softmax-regression and small feed-forward classifiers under an
//! (epsilon, delta) privacy budget. Three mechanisms are supported on top
//! of a non-private baseline: objective perturbation (a fixed Laplace
//! noise map folded into the objective), gradient perturbation (per-step
//! clipping plus Gaussian noise calibrated by one of four composition
//! theorems) and output perturbation (a one-shot Laplace draw on the
//! final parameters).
//!
//! # Example
//!
//! ```
//! use privatizar::data::Dataset;
//! use privatizar::dp::{AccountingMethod, PrivacyBudget};
//! use privatizar::model::SoftmaxModel;
//! use privatizar::train::{PrivacyMode, TrainConfig, Trainer};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! # fn run() -> privatizar::Result<()> {
//! let features = ndarray::array![[0.0_f32, 1.0], [1.0, 0.0], [0.2, 0.9], [0.8, 0.1]];
//! let data = Dataset::from_raw(features, vec![0, 1, 0, 1], None)?;
//!
//! let config = TrainConfig::new()
//!     .with_epochs(20)
//!     .with_privacy(PrivacyMode::GradPert)
//!     .with_accounting(AccountingMethod::Zcdp)
//!     .with_budget(PrivacyBudget::new(4.0, 1e-5));
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let model = SoftmaxModel::new(data.n_features(), data.n_classes(), &mut rng);
//! let outcome = Trainer::new(model, config).fit(&data, None, &mut rng)?;
//! println!("train accuracy {}", outcome.train_accuracy);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod data;
pub mod dp;
pub mod error;
pub mod model;
pub mod optim;
pub mod train;

pub use error::{Error, Result};
