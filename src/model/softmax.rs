//! Linear softmax regression.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use super::{cross_entropy, logit_gradient, softmax_rows, Model};

/// Linear softmax classifier: a single dense layer with a softmax head
///
/// Parameters: `[weights (n_in * n_out, row-major), bias (n_out)]`.
/// The L2 penalty applies to the weight matrix only, not the bias.
#[derive(Debug, Clone)]
pub struct SoftmaxModel {
    n_in: usize,
    n_out: usize,
    params: Vec<Array1<f32>>,
}

impl SoftmaxModel {
    /// Create a softmax model with Glorot-uniform weights and zero bias
    pub fn new<R: Rng + ?Sized>(n_in: usize, n_out: usize, rng: &mut R) -> Self {
        let params = vec![glorot_uniform(n_in, n_out, rng), Array1::zeros(n_out)];
        Self { n_in, n_out, params }
    }

    fn weights(&self) -> ArrayView2<'_, f32> {
        as_matrix(&self.params[0], self.n_in, self.n_out)
    }
}

impl Model for SoftmaxModel {
    fn params(&self) -> &[Array1<f32>] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [Array1<f32>] {
        &mut self.params
    }

    fn forward(&self, inputs: &Array2<f32>) -> Array2<f32> {
        let mut logits = inputs.dot(&self.weights()) + &self.params[1];
        softmax_rows(&mut logits);
        logits
    }

    fn loss_and_grads(
        &self,
        inputs: &Array2<f32>,
        targets: &[usize],
        l2_ratio: f32,
    ) -> (f32, Vec<Array1<f32>>) {
        let probs = self.forward(inputs);
        let loss = cross_entropy(&probs, targets)
            + l2_ratio * self.params[0].iter().map(|w| w * w).sum::<f32>();

        let dlogits = logit_gradient(&probs, targets);
        let gw = inputs.t().dot(&dlogits);
        let gw = Array1::from_iter(gw.iter().copied()) + &self.params[0] * (2.0 * l2_ratio);
        let gb = dlogits.sum_axis(Axis(0));

        (loss, vec![gw, gb])
    }

    fn n_classes(&self) -> usize {
        self.n_out
    }
}

/// View a flat parameter tensor as a (rows, cols) matrix
pub(super) fn as_matrix(param: &Array1<f32>, rows: usize, cols: usize) -> ArrayView2<'_, f32> {
    let slice = param.as_slice().expect("parameter tensors are contiguous");
    ArrayView2::from_shape((rows, cols), slice)
        .expect("parameter shape is fixed at construction")
}

/// Glorot-uniform initialization for a dense weight matrix
pub(super) fn glorot_uniform<R: Rng + ?Sized>(
    fan_in: usize,
    fan_out: usize,
    rng: &mut R,
) -> Array1<f32> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array1::from_iter((0..fan_in * fan_out).map(|_| rng.random_range(-limit..limit) as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_forward_shape_and_normalization() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let model = SoftmaxModel::new(4, 3, &mut rng);
        let inputs = Array2::from_shape_fn((5, 4), |(i, j)| (i + j) as f32 * 0.1);

        let probs = model.forward(&inputs);

        assert_eq!(probs.dim(), (5, 3));
        for row in probs.rows() {
            assert_relative_eq!(row.iter().sum::<f32>(), 1.0, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut model = SoftmaxModel::new(3, 2, &mut rng);
        let inputs = array![[0.5_f32, -0.2, 0.3], [0.1, 0.8, -0.4]];
        let targets = [0_usize, 1];
        let l2 = 0.01_f32;

        let (_, grads) = model.loss_and_grads(&inputs, &targets, l2);

        let h = 1e-3_f32;
        for p_idx in 0..2 {
            for coord in 0..model.params[p_idx].len() {
                let original = model.params[p_idx][coord];

                model.params[p_idx][coord] = original + h;
                let (loss_plus, _) = model.loss_and_grads(&inputs, &targets, l2);
                model.params[p_idx][coord] = original - h;
                let (loss_minus, _) = model.loss_and_grads(&inputs, &targets, l2);
                model.params[p_idx][coord] = original;

                let numeric = (loss_plus - loss_minus) / (2.0 * h);
                assert_relative_eq!(
                    grads[p_idx][coord],
                    numeric,
                    epsilon = 1e-3,
                    max_relative = 5e-2
                );
            }
        }
    }

    #[test]
    fn test_l2_penalty_applies_to_weights_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut model = SoftmaxModel::new(2, 2, &mut rng);
        let inputs = array![[1.0_f32, 0.0]];
        let targets = [0_usize];

        let (loss_no_l2, _) = model.loss_and_grads(&inputs, &targets, 0.0);
        let (loss_l2, _) = model.loss_and_grads(&inputs, &targets, 0.1);
        let weight_sq: f32 = model.params[0].iter().map(|w| w * w).sum();
        assert_relative_eq!(loss_l2 - loss_no_l2, 0.1 * weight_sq, max_relative = 1e-4);

        // Inflating the bias must not change the penalty term.
        model.params[1].mapv_inplace(|b| b + 100.0);
        let (a, _) = model.loss_and_grads(&inputs, &targets, 0.0);
        let (b, _) = model.loss_and_grads(&inputs, &targets, 0.1);
        assert_relative_eq!(b - a, 0.1 * weight_sq, max_relative = 1e-4);
    }

    #[test]
    fn test_apply_update_replaces_params() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut model = SoftmaxModel::new(2, 2, &mut rng);
        let rule = vec![Array1::ones(4), Array1::ones(2)];

        model.apply_update(rule);

        assert!(model.params()[0].iter().all(|&w| w == 1.0));
        assert!(model.params()[1].iter().all(|&b| b == 1.0));
    }
}
