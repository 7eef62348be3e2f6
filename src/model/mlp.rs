//! Two-hidden-layer feed-forward classifier.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use super::softmax::{as_matrix, glorot_uniform};
use super::{cross_entropy, logit_gradient, softmax_rows, Model, Nonlinearity};

/// Feed-forward network with two equal-width hidden layers and a
/// softmax head
///
/// Parameters, in order: `[w1, b1, w2, b2, w3, b3]`, weight matrices
/// flattened row-major. L2 penalty applies to the three weight matrices
/// only.
#[derive(Debug, Clone)]
pub struct MlpModel {
    n_in: usize,
    n_hidden: usize,
    n_out: usize,
    nonlinearity: Nonlinearity,
    params: Vec<Array1<f32>>,
}

impl MlpModel {
    /// Create a network with Glorot-uniform weights and zero biases
    pub fn new<R: Rng + ?Sized>(
        n_in: usize,
        n_hidden: usize,
        n_out: usize,
        nonlinearity: Nonlinearity,
        rng: &mut R,
    ) -> Self {
        let params = vec![
            glorot_uniform(n_in, n_hidden, rng),
            Array1::zeros(n_hidden),
            glorot_uniform(n_hidden, n_hidden, rng),
            Array1::zeros(n_hidden),
            glorot_uniform(n_hidden, n_out, rng),
            Array1::zeros(n_out),
        ];
        Self { n_in, n_hidden, n_out, nonlinearity, params }
    }

    fn w1(&self) -> ArrayView2<'_, f32> {
        as_matrix(&self.params[0], self.n_in, self.n_hidden)
    }

    fn w2(&self) -> ArrayView2<'_, f32> {
        as_matrix(&self.params[2], self.n_hidden, self.n_hidden)
    }

    fn w3(&self) -> ArrayView2<'_, f32> {
        as_matrix(&self.params[4], self.n_hidden, self.n_out)
    }

    /// Forward pass keeping the hidden activations for backprop
    fn forward_cached(&self, inputs: &Array2<f32>) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
        let mut a1 = inputs.dot(&self.w1()) + &self.params[1];
        a1.mapv_inplace(|z| self.nonlinearity.apply(z));

        let mut a2 = a1.dot(&self.w2()) + &self.params[3];
        a2.mapv_inplace(|z| self.nonlinearity.apply(z));

        let mut probs = a2.dot(&self.w3()) + &self.params[5];
        softmax_rows(&mut probs);

        (a1, a2, probs)
    }
}

impl Model for MlpModel {
    fn params(&self) -> &[Array1<f32>] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [Array1<f32>] {
        &mut self.params
    }

    fn forward(&self, inputs: &Array2<f32>) -> Array2<f32> {
        self.forward_cached(inputs).2
    }

    fn loss_and_grads(
        &self,
        inputs: &Array2<f32>,
        targets: &[usize],
        l2_ratio: f32,
    ) -> (f32, Vec<Array1<f32>>) {
        let (a1, a2, probs) = self.forward_cached(inputs);

        let weight_penalty: f32 = [0, 2, 4]
            .iter()
            .map(|&i| self.params[i].iter().map(|w| w * w).sum::<f32>())
            .sum();
        let loss = cross_entropy(&probs, targets) + l2_ratio * weight_penalty;

        let dlogits = logit_gradient(&probs, targets);

        let gw3 = a2.t().dot(&dlogits);
        let gb3 = dlogits.sum_axis(Axis(0));

        let mut dz2 = dlogits.dot(&self.w3().t());
        dz2.zip_mut_with(&a2, |d, &a| *d *= self.nonlinearity.derivative_from_output(a));
        let gw2 = a1.t().dot(&dz2);
        let gb2 = dz2.sum_axis(Axis(0));

        let mut dz1 = dz2.dot(&self.w2().t());
        dz1.zip_mut_with(&a1, |d, &a| *d *= self.nonlinearity.derivative_from_output(a));
        let gw1 = inputs.t().dot(&dz1);
        let gb1 = dz1.sum_axis(Axis(0));

        let reg = 2.0 * l2_ratio;
        let grads = vec![
            Array1::from_iter(gw1.iter().copied()) + &self.params[0] * reg,
            gb1,
            Array1::from_iter(gw2.iter().copied()) + &self.params[2] * reg,
            gb2,
            Array1::from_iter(gw3.iter().copied()) + &self.params[4] * reg,
            gb3,
        ];

        (loss, grads)
    }

    fn n_classes(&self) -> usize {
        self.n_out
    }
}
