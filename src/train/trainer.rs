//! The training loop: minibatch epochs with optional privacy perturbation.

use ndarray::{Array2, Axis};
use rand::Rng;

use crate::data::{Dataset, Minibatches};
use crate::dp::{
    laplace_noise_like, noise_scale, output_noise_scale, perturb_output, ObjectiveCalibration,
    Perturbation, RunShape,
};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::optim::Adam;

use super::config::{PrivacyMode, TrainConfig};
use super::metrics::{accuracy, argmax_rows};

/// Everything a completed training run reports
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Summed minibatch loss of the final epoch
    pub train_loss: f32,
    /// Accuracy on the training partition after training
    pub train_accuracy: f32,
    /// Predicted labels for the test partition when present, otherwise
    /// for the training partition
    pub predicted_labels: Vec<usize>,
    /// Raw class probabilities for the test partition
    pub prediction_scores: Option<Array2<f32>>,
    /// Accuracy on the test partition, if one was supplied
    pub test_accuracy: Option<f32>,
    /// Accuracy of the independent warm-up pass on its own partition
    pub holdout_accuracy: Option<f32>,
}

/// Trains a model under one of the four privacy modes
///
/// The trainer owns the model for the duration of the run. All noise is
/// drawn from the caller-supplied rng; the trainer itself holds no random
/// state.
pub struct Trainer<M: Model + Clone> {
    model: M,
    config: TrainConfig,
}

impl<M: Model + Clone> Trainer<M> {
    /// Create a trainer from a freshly initialized model and a config
    pub fn new(model: M, config: TrainConfig) -> Self {
        Self { model, config }
    }

    /// Borrow the trained model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Consume the trainer and return the trained model
    pub fn into_model(self) -> M {
        self.model
    }

    /// Run the full training procedure
    ///
    /// When a hold-out partition is supplied, an independent warm-up pass
    /// trains a fresh copy of the initial model on it first, reporting
    /// only its accuracy. The warm-up never touches the parameters of
    /// the main run.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        data: &Dataset,
        holdout: Option<(&Array2<f32>, &[usize])>,
        rng: &mut R,
    ) -> Result<TrainOutcome> {
        self.config.validate()?;

        let n = data.len();
        let batch_size = self.config.batch_size.min(n);
        let lr = self.config.learning_rate;

        let holdout_accuracy = match holdout {
            Some((features, labels)) => Some(self.warm_up(features, labels, batch_size, rng)?),
            None => None,
        };

        // Privacy setup. Objective perturbation folds extra regularization
        // and a fixed noise map into every step; gradient perturbation
        // clips and noises per step; output perturbation waits until after
        // the epoch loop.
        let mut l2_ratio = self.config.l2_ratio;
        let perturbation = match self.config.privacy {
            PrivacyMode::NoPrivacy | PrivacyMode::OutPert => None,
            PrivacyMode::ObjPert => {
                let cal = ObjectiveCalibration::calibrate(
                    self.config.budget.epsilon,
                    f64::from(l2_ratio),
                    n,
                )?;
                l2_ratio += cal.delta_reg as f32;
                let noise = self
                    .model
                    .params()
                    .iter()
                    .map(|param| laplace_noise_like(param, cal.scale, rng) / n as f32)
                    .collect();
                Some(Perturbation::Additive { noise })
            }
            PrivacyMode::GradPert => {
                let shape = RunShape::new(self.config.epochs, batch_size, n);
                let sigma = noise_scale(self.config.dp, self.config.budget, shape)?;
                if !self.config.silent {
                    println!("noise scale sigma = {sigma}");
                }
                Some(Perturbation::Gradient { sigma, clip_bound: self.config.clip_bound })
            }
        };

        let mut optimizer = Adam::default_params(lr);
        let mut train_loss = 0.0;
        for epoch in 0..self.config.epochs {
            let mut epoch_loss = 0.0_f32;
            let batches =
                Minibatches::new(&data.train_x, &data.train_y, batch_size, true, rng)?;
            for batch in batches {
                let (loss, grads) =
                    self.model.loss_and_grads(&batch.inputs, &batch.targets, l2_ratio);
                epoch_loss += loss;

                let mut rule = optimizer.propose(self.model.params(), &grads);
                if let Some(engine) = &perturbation {
                    rule = engine.rewrite(rule, self.model.params(), lr, rng);
                }
                self.model.apply_update(rule);
            }
            if !epoch_loss.is_finite() {
                return Err(Error::Diverged { epoch });
            }
            train_loss = epoch_loss;
            if !self.config.silent {
                println!("Epoch {epoch}, train loss {epoch_loss:.3}");
            }
        }

        if self.config.privacy == PrivacyMode::OutPert {
            let scale = output_noise_scale(
                f64::from(self.config.l2_ratio),
                self.config.budget.epsilon,
            )?;
            perturb_output(self.model.params_mut(), scale, n, rng);
        }

        // Evaluation walks each partition unshuffled.
        let train_predictions =
            self.predict(&data.train_x, &data.train_y, batch_size, rng)?;
        let train_accuracy = accuracy(&argmax_rows(&train_predictions), &data.train_y);
        if !self.config.silent {
            println!("Training accuracy: {train_accuracy}");
        }

        let outcome = match (&data.test_x, &data.test_y) {
            (Some(test_x), Some(test_y)) => {
                let eval_batch = batch_size.min(test_y.len());
                let scores = self.predict(test_x, test_y, eval_batch, rng)?;
                let predicted_labels = argmax_rows(&scores);
                let test_accuracy = accuracy(&predicted_labels, test_y);
                if !self.config.silent {
                    println!("Testing accuracy: {test_accuracy}");
                }
                TrainOutcome {
                    train_loss,
                    train_accuracy,
                    predicted_labels,
                    prediction_scores: Some(scores),
                    test_accuracy: Some(test_accuracy),
                    holdout_accuracy,
                }
            }
            _ => TrainOutcome {
                train_loss,
                train_accuracy,
                predicted_labels: argmax_rows(&train_predictions),
                prediction_scores: None,
                test_accuracy: None,
                holdout_accuracy,
            },
        };

        Ok(outcome)
    }

    /// Independent warm-up pass on the hold-out partition
    ///
    /// Runs the plain (noise-free) epoch loop on a fresh copy of the
    /// initial model and reports its accuracy on that partition.
    fn warm_up<R: Rng + ?Sized>(
        &self,
        features: &Array2<f32>,
        labels: &[usize],
        batch_size: usize,
        rng: &mut R,
    ) -> Result<f32> {
        let mut model = self.model.clone();
        let mut optimizer = Adam::default_params(self.config.learning_rate);
        let batch_size = batch_size.min(labels.len());

        if !self.config.silent {
            println!("Training on hold-out data...");
        }
        for epoch in 0..self.config.epochs {
            let mut epoch_loss = 0.0_f32;
            for batch in Minibatches::new(features, labels, batch_size, true, rng)? {
                let (loss, grads) =
                    model.loss_and_grads(&batch.inputs, &batch.targets, self.config.l2_ratio);
                epoch_loss += loss;
                let rule = optimizer.propose(model.params(), &grads);
                model.apply_update(rule);
            }
            if !epoch_loss.is_finite() {
                return Err(Error::Diverged { epoch });
            }
            if !self.config.silent {
                println!("Epoch {epoch}, hold-out loss {epoch_loss:.3}");
            }
        }

        let mut scores = Vec::new();
        for batch in Minibatches::new(features, labels, batch_size, false, rng)? {
            scores.push(model.forward(&batch.inputs));
        }
        let views: Vec<_> = scores.iter().map(Array2::view).collect();
        let scores = ndarray::concatenate(Axis(0), &views)
            .map_err(|e| Error::InvalidData(e.to_string()))?;
        let acc = accuracy(&argmax_rows(&scores), labels);
        if !self.config.silent {
            println!("Hold-out training accuracy: {acc}");
        }
        Ok(acc)
    }

    /// Forward the model over a partition in unshuffled batches
    fn predict<R: Rng + ?Sized>(
        &self,
        features: &Array2<f32>,
        labels: &[usize],
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Array2<f32>> {
        let mut scores = Vec::new();
        for batch in Minibatches::new(features, labels, batch_size, false, rng)? {
            scores.push(self.model.forward(&batch.inputs));
        }
        let views: Vec<_> = scores.iter().map(Array2::view).collect();
        ndarray::concatenate(Axis(0), &views).map_err(|e| Error::InvalidData(e.to_string()))
    }
}
