//! Training loop, configuration and metrics.

mod config;
mod metrics;
mod trainer;

pub use config::{PrivacyMode, TrainConfig};
pub use metrics::{accuracy, argmax_rows};
pub use trainer::{TrainOutcome, Trainer};
