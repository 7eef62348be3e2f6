//! CLI entry point: argument parsing and the train command.

mod logging;

pub use logging::{log, LogLevel};

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

use crate::data::{load_dataset, Dataset};
use crate::dp::{AccountingMethod, PrivacyBudget};
use crate::error::Result;
use crate::model::{MlpModel, Model, ModelKind, Nonlinearity, SoftmaxModel};
use crate::train::{PrivacyMode, TrainConfig, TrainOutcome, Trainer};

/// Privatizar: differentially private classifier training
#[derive(Parser, Debug, Clone)]
#[command(name = "privatizar")]
#[command(version)]
#[command(about = "Train a classifier under a differential privacy budget")]
pub struct Cli {
    /// Path to the training feature matrix (comma-delimited)
    #[arg(value_name = "TRAIN_FEAT")]
    pub train_feat: PathBuf,

    /// Path to the training labels (one integer per line)
    #[arg(value_name = "TRAIN_LABEL")]
    pub train_label: PathBuf,

    /// Path to the test feature matrix
    #[arg(long)]
    pub test_feat: Option<PathBuf>,

    /// Path to the test labels
    #[arg(long)]
    pub test_label: Option<PathBuf>,

    /// Model architecture: nn or softmax
    #[arg(long, default_value = "nn")]
    pub model: String,

    /// Hidden-layer nonlinearity: relu or tanh
    #[arg(long, default_value = "relu")]
    pub non_linearity: String,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f32,

    /// Minibatch size
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Hidden-layer width
    #[arg(long, default_value_t = 50)]
    pub n_hidden: usize,

    /// Number of training epochs
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// L2 regularization ratio
    #[arg(long, default_value_t = 1e-7)]
    pub l2_ratio: f32,

    /// Privacy mode: no_privacy, obj_pert, grad_pert or out_pert
    #[arg(long, default_value = "no_privacy")]
    pub privacy: String,

    /// Accounting method for grad_pert: adv_cmp, zcdp, rdp or dp
    #[arg(long, default_value = "dp")]
    pub dp: String,

    /// Privacy budget epsilon
    #[arg(long, default_value_t = 0.5)]
    pub epsilon: f64,

    /// Privacy budget delta
    #[arg(long, default_value_t = 1e-5)]
    pub delta: f64,

    /// Gradient clipping bound for grad_pert
    #[arg(long, default_value_t = 1.0)]
    pub clip_bound: f64,

    /// Seed for model initialization and noise draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print per-epoch progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Quiet
        } else if self.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }

    fn train_config(&self) -> Result<TrainConfig> {
        let config = TrainConfig::new()
            .with_n_hidden(self.n_hidden)
            .with_batch_size(self.batch_size)
            .with_epochs(self.epochs)
            .with_learning_rate(self.learning_rate)
            .with_l2_ratio(self.l2_ratio)
            .with_clip_bound(self.clip_bound)
            .with_nonlinearity(Nonlinearity::from_tag(&self.non_linearity)?)
            .with_privacy(PrivacyMode::from_tag(&self.privacy)?)
            .with_accounting(AccountingMethod::from_tag(&self.dp)?)
            .with_budget(PrivacyBudget::new(self.epsilon, self.delta))
            .with_silent(!self.verbose);
        config.validate()?;
        Ok(config)
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Run the train command
pub fn run_command(cli: Cli) -> Result<()> {
    let level = cli.log_level();
    let config = cli.train_config()?;
    let kind = ModelKind::from_tag(&cli.model)?;

    if let Ok(json) = serde_json::to_string(&config) {
        log(level, LogLevel::Verbose, &json);
    }

    let data = load_dataset(
        &cli.train_feat,
        &cli.train_label,
        cli.test_feat.as_deref(),
        cli.test_label.as_deref(),
    )?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Loaded {} training examples, {} features, {} classes",
            data.len(),
            data.n_features(),
            data.n_classes()
        ),
    );

    let mut rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    };

    let outcome = match kind {
        ModelKind::Nn => {
            let model = MlpModel::new(
                data.n_features(),
                config.n_hidden,
                data.n_classes(),
                config.nonlinearity,
                &mut rng,
            );
            fit_and_report(model, config, &data, &mut rng)?
        }
        ModelKind::Softmax => {
            let model = SoftmaxModel::new(data.n_features(), data.n_classes(), &mut rng);
            fit_and_report(model, config, &data, &mut rng)?
        }
    };

    log(level, LogLevel::Normal, &format!("Train loss: {:.3}", outcome.train_loss));
    log(
        level,
        LogLevel::Normal,
        &format!("Train accuracy: {:.4}", outcome.train_accuracy),
    );
    if let Some(test_accuracy) = outcome.test_accuracy {
        log(level, LogLevel::Normal, &format!("Test accuracy: {test_accuracy:.4}"));
    }

    Ok(())
}

fn fit_and_report<M: Model + Clone>(
    model: M,
    config: TrainConfig,
    data: &Dataset,
    rng: &mut ChaCha8Rng,
) -> Result<TrainOutcome> {
    let mut trainer = Trainer::new(model, config);
    trainer.fit(data, None, rng)
}
