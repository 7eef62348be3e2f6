//! Privatizar CLI
//!
//! Command-line entry point for differentially private classifier
//! training.
//!
//! # Usage
//!
//! ```bash
//! # Non-private baseline
//! privatizar train_feat.csv train_labels.txt
//!
//! # Gradient perturbation under zCDP accounting
//! privatizar train_feat.csv train_labels.txt \
//!     --privacy grad_pert --dp zcdp --epsilon 1.0
//!
//! # Softmax regression with a test partition
//! privatizar train_feat.csv train_labels.txt \
//!     --test-feat test_feat.csv --test-label test_labels.txt \
//!     --model softmax
//! ```

use clap::Parser;
use privatizar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
