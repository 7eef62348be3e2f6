//! Minibatch iteration over a dataset partition.

use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};

/// A training batch containing gathered input rows and their targets
#[derive(Debug, Clone)]
pub struct Batch {
    /// Input features, one row per example
    pub inputs: Array2<f32>,
    /// Target class indices, row-aligned with `inputs`
    pub targets: Vec<usize>,
}

impl Batch {
    /// Number of examples in the batch
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if the batch holds no examples
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Lazy, finite, non-restartable minibatch sequence
///
/// Walks the (possibly permuted) row indices in steps of the batch size.
/// Every row is consumed exactly once: all batches are full-size except
/// a possibly-short final remainder batch. When shuffling, a single
/// permutation is drawn at construction and applied to inputs and
/// targets consistently.
pub struct Minibatches<'a> {
    features: &'a Array2<f32>,
    labels: &'a [usize],
    batch_size: usize,
    order: Vec<usize>,
    cursor: usize,
}

impl<'a> Minibatches<'a> {
    /// Create a minibatch iterator
    ///
    /// Fails fast with `Error::LengthMismatch` before yielding anything
    /// if `features` and `labels` disagree on the row count. The caller
    /// is expected to clamp `batch_size` to the partition size first.
    pub fn new<R: Rng + ?Sized>(
        features: &'a Array2<f32>,
        labels: &'a [usize],
        batch_size: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(Error::LengthMismatch {
                inputs: features.nrows(),
                targets: labels.len(),
            });
        }
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".to_string()));
        }

        let mut order: Vec<usize> = (0..labels.len()).collect();
        if shuffle {
            order.shuffle(rng);
        }

        Ok(Self { features, labels, batch_size, order, cursor: 0 })
    }

    fn gather(&self, indices: &[usize]) -> Batch {
        let inputs = self.features.select(Axis(0), indices);
        let targets = indices.iter().map(|&i| self.labels[i]).collect();
        Batch { inputs, targets }
    }
}

impl Iterator for Minibatches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.gather(&self.order[self.cursor..end]);
        self.cursor = end;
        Some(batch)
    }
}
