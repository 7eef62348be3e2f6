//! Dataset loading and minibatch iteration

mod batch;
mod dataset;
mod load;

pub use batch::{Batch, Minibatches};
pub use dataset::Dataset;
pub use load::{load_dataset, read_feature_matrix, read_labels};
