//! Classification metrics.

use ndarray::Array2;

/// Index of the largest score in each row
pub fn argmax_rows(scores: &Array2<f32>) -> Vec<usize> {
    scores
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(i, _)| i)
                .unwrap_or(0)
        })
        .collect()
}

/// Fraction of predictions matching the actual labels
pub fn accuracy(predicted: &[usize], actual: &[usize]) -> f32 {
    assert_eq!(predicted.len(), actual.len(), "prediction and label counts must match");
    if predicted.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(actual.iter()).filter(|(p, a)| p == a).count();
    correct as f32 / predicted.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_rows() {
        let scores = array![[0.1_f32, 0.7, 0.2], [0.9, 0.05, 0.05]];
        assert_eq!(argmax_rows(&scores), vec![1, 0]);
    }

    #[test]
    fn test_argmax_rows_ties_take_first() {
        let scores = array![[0.5_f32, 0.5]];
        assert_eq!(argmax_rows(&scores), vec![0]);
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 1], &[0, 1, 1, 1]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
