//! Labeled dataset with train/test partitions.

use ndarray::Array2;
use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// A labeled dataset split into a train partition and an optional test
/// partition
///
/// Labels are remapped at construction so the smallest train label
/// becomes 0; the same offset is applied to the test partition, keeping
/// the two aligned. After remapping the train label set must be a
/// contiguous range starting at 0.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Training features, one row per example
    pub train_x: Array2<f32>,
    /// Training labels, remapped to 0..n_classes
    pub train_y: Vec<usize>,
    /// Test features, if a test partition was supplied
    pub test_x: Option<Array2<f32>>,
    /// Test labels, remapped with the train offset
    pub test_y: Option<Vec<usize>>,
    n_classes: usize,
}

impl Dataset {
    /// Build a dataset from raw integer labels, remapping them to start at 0
    pub fn from_raw(
        train_x: Array2<f32>,
        train_y: Vec<i64>,
        test: Option<(Array2<f32>, Vec<i64>)>,
    ) -> Result<Self> {
        if train_x.nrows() != train_y.len() {
            return Err(Error::LengthMismatch {
                inputs: train_x.nrows(),
                targets: train_y.len(),
            });
        }
        if train_y.is_empty() {
            return Err(Error::InvalidData("train partition is empty".to_string()));
        }

        let min_y = *train_y.iter().min().unwrap_or(&0);
        let labels: BTreeSet<i64> = train_y.iter().map(|&y| y - min_y).collect();
        let n_classes = labels.len();
        let max = *labels.iter().next_back().unwrap_or(&0);
        if max as usize + 1 != n_classes {
            return Err(Error::InvalidData(format!(
                "train labels must form a contiguous range, got {n_classes} distinct values spanning 0..={max}"
            )));
        }

        let train_y = train_y.iter().map(|&y| (y - min_y) as usize).collect();

        let (test_x, test_y) = match test {
            Some((x, y)) => {
                if x.nrows() != y.len() {
                    return Err(Error::LengthMismatch { inputs: x.nrows(), targets: y.len() });
                }
                if x.ncols() != train_x.ncols() {
                    return Err(Error::InvalidData(format!(
                        "test partition has {} features, train has {}",
                        x.ncols(),
                        train_x.ncols()
                    )));
                }
                let y = y
                    .iter()
                    .map(|&v| {
                        let remapped = v - min_y;
                        if remapped < 0 || remapped as usize >= n_classes {
                            Err(Error::InvalidData(format!(
                                "test label {v} falls outside the train label range"
                            )))
                        } else {
                            Ok(remapped as usize)
                        }
                    })
                    .collect::<Result<Vec<usize>>>()?;
                (Some(x), Some(y))
            }
            None => (None, None),
        };

        Ok(Self { train_x, train_y, test_x, test_y, n_classes })
    }

    /// Number of training examples
    pub fn len(&self) -> usize {
        self.train_y.len()
    }

    /// True if the train partition is empty
    pub fn is_empty(&self) -> bool {
        self.train_y.is_empty()
    }

    /// Feature count, uniform across all rows
    pub fn n_features(&self) -> usize {
        self.train_x.ncols()
    }

    /// Number of distinct classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_labels_remapped_to_zero_base() {
        let x = array![[1.0_f32], [2.0], [3.0]];
        let ds = Dataset::from_raw(x, vec![5, 7, 6], None).unwrap();
        assert_eq!(ds.train_y, vec![0, 2, 1]);
        assert_eq!(ds.n_classes(), 3);
    }

    #[test]
    fn test_test_partition_shares_offset() {
        let x = array![[1.0_f32], [2.0]];
        let tx = array![[3.0_f32]];
        let ds = Dataset::from_raw(x, vec![10, 11], Some((tx, vec![11]))).unwrap();
        assert_eq!(ds.test_y.unwrap(), vec![1]);
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        let x = array![[1.0_f32], [2.0]];
        assert!(matches!(
            Dataset::from_raw(x, vec![0], None),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_non_contiguous_labels_rejected() {
        let x = array![[1.0_f32], [2.0]];
        assert!(Dataset::from_raw(x, vec![0, 2], None).is_err());
    }

    #[test]
    fn test_test_label_outside_train_range_rejected() {
        let x = array![[1.0_f32], [2.0]];
        let tx = array![[3.0_f32]];
        assert!(Dataset::from_raw(x, vec![0, 1], Some((tx, vec![5]))).is_err());
    }

    #[test]
    fn test_feature_width_mismatch_rejected() {
        let x = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let tx = array![[5.0_f32]];
        assert!(Dataset::from_raw(x, vec![0, 1], Some((tx, vec![0]))).is_err());
    }
}
