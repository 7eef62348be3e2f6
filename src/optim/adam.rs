//! Adam optimizer producing parameter update rules.

use ndarray::Array1;

use super::UpdateRule;

/// Adam optimizer (Kingma & Ba, 2015)
///
/// Instead of mutating parameters in place, `propose` returns an update
/// rule: the proposed post-step value for every parameter. The trainer
/// may hand that rule to the perturbation engine before applying it,
/// which is how gradient and objective perturbation hook into the
/// update without touching the optimizer state.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>, // First moment
    v: Vec<Option<Array1<f32>>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Create Adam with the standard defaults
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    /// Get learning rate
    pub fn lr(&self) -> f32 {
        self.lr
    }

    /// Set learning rate
    pub fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn ensure_moments(&mut self, params: &[Array1<f32>]) {
        if self.m.is_empty() {
            self.m = params.iter().map(|_| None).collect();
            self.v = params.iter().map(|_| None).collect();
        }
    }

    /// Propose an update rule for `params` given their gradients
    ///
    /// The returned rule is index-aligned with `params`; entry i is the
    /// proposed new value of `params[i]`. Moment state advances once per
    /// call.
    pub fn propose(&mut self, params: &[Array1<f32>], grads: &[Array1<f32>]) -> UpdateRule {
        debug_assert_eq!(params.len(), grads.len());
        self.ensure_moments(params);
        self.t += 1;

        // Bias correction folded into the step size
        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        params
            .iter()
            .zip(grads.iter())
            .enumerate()
            .map(|(i, (param, grad))| {
                let m = self.m[i].get_or_insert_with(|| Array1::zeros(param.len()));
                let v = self.v[i].get_or_insert_with(|| Array1::zeros(param.len()));

                *m = &*m * self.beta1 + &(grad * (1.0 - self.beta1));
                *v = &*v * self.beta2 + &(grad.mapv(|g| g * g) * (1.0 - self.beta2));

                let step = m.iter().zip(v.iter()).map(|(&mi, &vi)| {
                    lr_t * mi / (vi.sqrt() + self.epsilon)
                });
                param - &Array1::from_iter(step)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_propose_moves_against_gradient() {
        let mut opt = Adam::default_params(0.1);
        let params = vec![array![1.0_f32, 2.0, 3.0]];
        let grads = vec![array![1.0_f32, -1.0, 0.0]];

        let rule = opt.propose(&params, &grads);

        assert!(rule[0][0] < 1.0);
        assert!(rule[0][1] > 2.0);
        assert_eq!(rule[0][2], 3.0);
    }

    #[test]
    fn test_propose_does_not_mutate_params() {
        let mut opt = Adam::default_params(0.1);
        let params = vec![array![1.0_f32, 2.0]];
        let grads = vec![array![0.5_f32, 0.5]];

        let _ = opt.propose(&params, &grads);

        assert_eq!(params[0], array![1.0_f32, 2.0]);
    }

    #[test]
    fn test_first_step_magnitude_close_to_lr() {
        // With bias correction, the first Adam step is about lr per
        // coordinate for any nonzero gradient.
        let mut opt = Adam::default_params(0.01);
        let params = vec![array![0.0_f32]];
        let grads = vec![array![3.0_f32]];

        let rule = opt.propose(&params, &grads);

        assert!((rule[0][0].abs() - 0.01).abs() < 1e-3);
    }

    #[test]
    fn test_converges_on_quadratic() {
        // Minimize f(x) = (x - 5)^2 with gradient 2(x - 5).
        let mut opt = Adam::default_params(0.1);
        let mut params = vec![array![0.0_f32]];

        for _ in 0..500 {
            let grads = vec![array![2.0 * (params[0][0] - 5.0)]];
            params = opt.propose(&params, &grads);
        }

        assert!((params[0][0] - 5.0).abs() < 0.1);
    }

    #[test]
    fn test_lr_accessors() {
        let mut opt = Adam::default_params(0.01);
        assert_eq!(opt.lr(), 0.01);
        opt.set_lr(0.1);
        assert_eq!(opt.lr(), 0.1);
    }
}
