use rand::Rng;
use tracing::{debug, info};

use crate::activation::relu;
use crate::matmul::matmul;
use crate::metrics::{argmax, count_hits, is_hit};
use crate::{
    Dataset, Error, ExecutionStats, Inputs, Model, PredictConfig, Result, StepOutcome,
    TrainConfig, TrainReport, loss,
};

/// A training run's data: one training set and one held-out test set.
#[derive(Debug, Clone)]
pub struct Training {
    train: Dataset,
    test: Dataset,
}

impl Training {
    /// Both datasets must be non-empty and agree on input and target dimensions.
    pub fn new(train: Dataset, test: Dataset) -> Result<Self> {
        if train.is_empty() {
            return Err(Error::InvalidData(
                "train dataset must not be empty".to_owned(),
            ));
        }
        if test.is_empty() {
            return Err(Error::InvalidData(
                "test dataset must not be empty".to_owned(),
            ));
        }
        if train.input_dim() != test.input_dim() {
            return Err(Error::InvalidData(format!(
                "train input_dim {} does not match test input_dim {}",
                train.input_dim(),
                test.input_dim()
            )));
        }
        if train.target_dim() != test.target_dim() {
            return Err(Error::InvalidData(format!(
                "train target_dim {} does not match test target_dim {}",
                train.target_dim(),
                test.target_dim()
            )));
        }

        Ok(Self { train, test })
    }

    #[inline]
    pub fn train_set(&self) -> &Dataset {
        &self.train
    }

    #[inline]
    pub fn test_set(&self) -> &Dataset {
        &self.test
    }

    /// One epoch of online SGD over the training set, in storage order.
    ///
    /// Every sample runs forward (with dropout), backward, then updates the weights in
    /// place before the next sample is seen. Loss and hits are measured on the output
    /// of the forward pass, before that sample's update.
    ///
    /// Panics if the model dimensions do not match the data.
    pub fn training_step<R: Rng + ?Sized>(
        &self,
        model: &mut Model,
        learning_rate: f32,
        rng: &mut R,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        for (input, label) in self.train.iter() {
            let fwd = model.forward(input, rng);
            let bp = model.backward(&fwd, label);
            model.apply_update(&fwd, &bp, learning_rate);

            outcome.loss += loss::squared_error(fwd.output(), label);
            if is_hit(fwd.output(), label) {
                outcome.hits += 1;
            }
        }
        outcome
    }

    /// Loss and hits on the test set with dropout disabled.
    ///
    /// Runs as two batched matrix multiplies over the whole set:
    /// `relu(X * W1) * W2`. Does not touch the weights or any RNG.
    ///
    /// Panics if the model dimensions do not match the data.
    pub fn evaluation_step(&self, model: &Model) -> StepOutcome {
        let preds = batch_scores(model, self.test.inputs());
        StepOutcome {
            loss: loss::squared_error(&preds, self.test.targets()),
            hits: count_hits(&preds, self.test.targets(), self.test.target_dim()),
        }
    }

    /// Run exactly `cfg.epochs` epochs, recording train and test statistics after each.
    ///
    /// There is no early stopping or checkpointing.
    pub fn train<R: Rng + ?Sized>(
        &self,
        model: &mut Model,
        cfg: &TrainConfig,
        rng: &mut R,
    ) -> Result<TrainReport> {
        cfg.validate()?;
        self.check_model(model)?;

        info!(
            epochs = cfg.epochs,
            learning_rate = cfg.learning_rate,
            train_len = self.train.len(),
            test_len = self.test.len(),
            hidden_size = model.hidden_size(),
            "starting training"
        );

        let mut report = TrainReport {
            train: ExecutionStats::new(),
            test: ExecutionStats::new(),
        };
        for epoch in 0..cfg.epochs {
            let outcome = self.training_step(model, cfg.learning_rate, rng);
            report.train.push(outcome, self.train.len());

            let outcome = self.evaluation_step(model);
            report.test.push(outcome, self.test.len());

            if let (Some((train_err, train_acc)), Some((test_err, test_acc))) =
                (report.train.last(), report.test.last())
            {
                info!(
                    epoch = epoch + 1,
                    train_err, train_acc, test_err, test_acc, "epoch finished"
                );
            }
        }

        debug!(epochs = report.epochs(), "training finished");
        Ok(report)
    }

    fn check_model(&self, model: &Model) -> Result<()> {
        if model.image_pixels() != self.train.input_dim() {
            return Err(Error::InvalidShape(format!(
                "model image_pixels {} does not match data input_dim {}",
                model.image_pixels(),
                self.train.input_dim()
            )));
        }
        if model.num_labels() != self.train.target_dim() {
            return Err(Error::InvalidShape(format!(
                "model num_labels {} does not match data target_dim {}",
                model.num_labels(),
                self.train.target_dim()
            )));
        }
        Ok(())
    }
}

/// `relu(X * W1) * W2` for every row of `inputs`, as a flat `(len, num_labels)` buffer.
fn batch_scores(model: &Model, inputs: &Inputs) -> Vec<f32> {
    assert_eq!(
        inputs.input_dim(),
        model.image_pixels(),
        "inputs input_dim {} does not match model image_pixels {}",
        inputs.input_dim(),
        model.image_pixels()
    );

    let rows = inputs.len();
    let mut hidden = vec![0.0_f32; rows * model.hidden_size()];
    matmul(
        rows,
        model.image_pixels(),
        model.hidden_size(),
        inputs.as_slice(),
        model.w1(),
        &mut hidden,
    );
    for h in &mut hidden {
        *h = relu(*h);
    }

    let mut scores = vec![0.0_f32; rows * model.num_labels()];
    matmul(
        rows,
        model.hidden_size(),
        model.num_labels(),
        &hidden,
        model.w2(),
        &mut scores,
    );
    scores
}

impl Model {
    /// Raw output scores for every input, in input order.
    ///
    /// With `cfg.training_mode` set, each input goes through the dropout forward pass
    /// and consumes randomness from `rng`; otherwise the pass is deterministic.
    pub fn predict<R: Rng + ?Sized>(
        &self,
        inputs: &Inputs,
        cfg: &PredictConfig,
        rng: &mut R,
    ) -> Result<Vec<Vec<f32>>> {
        if inputs.input_dim() != self.image_pixels() {
            return Err(Error::InvalidShape(format!(
                "inputs input_dim {} does not match model image_pixels {}",
                inputs.input_dim(),
                self.image_pixels()
            )));
        }

        debug!(
            len = inputs.len(),
            training_mode = cfg.training_mode,
            "predicting"
        );
        let preds = inputs
            .iter()
            .map(|x| {
                let fwd = if cfg.training_mode {
                    self.forward(x, rng)
                } else {
                    self.forward_without_dropout(x)
                };
                fwd.into_output()
            })
            .collect();
        Ok(preds)
    }

    /// Predicted class per input (argmax of the raw scores).
    pub fn predict_labels<R: Rng + ?Sized>(
        &self,
        inputs: &Inputs,
        cfg: &PredictConfig,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        let preds = self.predict(inputs, cfg, rng)?;
        Ok(preds.iter().map(|p| argmax(p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelConfig;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tiny_cfg() -> ModelConfig {
        ModelConfig {
            hidden_size: 4,
            image_pixels: 4,
            num_labels: 2,
        }
    }

    fn tiny_training() -> Training {
        let train = Dataset::from_flat(
            vec![
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0,
            ],
            vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.0],
            4,
            2,
        )
        .unwrap();
        let test = Dataset::from_flat(
            vec![
                0.5, 0.5, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
            vec![0.0, 1.0, 1.0, 0.0],
            4,
            2,
        )
        .unwrap();
        Training::new(train, test).unwrap()
    }

    #[test]
    fn zero_weights_are_a_fixed_point() {
        let train = Dataset::from_flat(vec![1.0, 0.0, 0.0, 0.0], vec![1.0, 0.0], 4, 2).unwrap();
        let training = Training::new(train.clone(), train).unwrap();
        let mut model = Model::zeros(&tiny_cfg()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = training.training_step(&mut model, 1.0, &mut rng);

        assert_eq!(model, Model::zeros(&tiny_cfg()).unwrap());
        // Output [0, 0] vs label [1, 0]: loss 1, tie resolves to class 0.
        assert_eq!(outcome, StepOutcome { loss: 1.0, hits: 1 });
    }

    #[test]
    fn evaluation_is_deterministic() {
        let training = tiny_training();
        let model = Model::new_with_seed(&tiny_cfg(), 42).unwrap();
        let a = training.evaluation_step(&model);
        let b = training.evaluation_step(&model);
        assert_eq!(a, b);
    }

    #[test]
    fn evaluation_matches_hand_computation() {
        let training = tiny_training();
        // W1 = identity, W2 rows: [1, 0], [0, 1], [2, 0], [-1, 1]
        let mut w1 = vec![0.0; 16];
        for i in 0..4 {
            w1[i * 4 + i] = 1.0;
        }
        let model = Model::from_weights(
            4,
            4,
            2,
            w1,
            vec![1.0, 0.0, 0.0, 1.0, 2.0, 0.0, -1.0, 1.0],
        )
        .unwrap();

        // sample 0: hidden [0.5, 0.5, 0, 0] -> out [0.5, 0.5], label [0, 1]
        //   residual [-0.5, 0.5] -> 0.5, argmax tie -> 0, miss
        // sample 1: hidden [0, 0, 0, 1] -> out [-1, 1], label [1, 0]
        //   residual [2, -1] -> 5, argmax 1, miss
        let outcome = training.evaluation_step(&model);
        assert_eq!(outcome, StepOutcome { loss: 5.5, hits: 0 });
    }

    #[test]
    fn evaluation_agrees_with_per_sample_forward() {
        let training = tiny_training();
        let model = Model::new_with_seed(&tiny_cfg(), 7).unwrap();

        let mut expected = StepOutcome::default();
        for (x, y) in training.test_set().iter() {
            let fwd = model.forward_without_dropout(x);
            expected.loss += loss::squared_error(fwd.output(), y);
            expected.hits += usize::from(is_hit(fwd.output(), y));
        }

        let got = training.evaluation_step(&model);
        assert_relative_eq!(got.loss, expected.loss, max_relative = 1e-5);
        assert_eq!(got.hits, expected.hits);
    }

    #[test]
    fn train_records_one_entry_per_epoch() {
        let training = tiny_training();
        let mut model = Model::new_with_seed(&tiny_cfg(), 1).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        for epochs in [0, 1, 3] {
            let cfg = TrainConfig {
                epochs,
                learning_rate: 0.05,
            };
            let report = training.train(&mut model, &cfg, &mut rng).unwrap();
            assert_eq!(report.epochs(), epochs);
            for stats in [&report.train, &report.test] {
                assert_eq!(stats.err().len(), epochs);
                assert_eq!(stats.acc().len(), epochs);
                assert!(stats.acc().iter().all(|a| (0.0..=1.0).contains(a)));
            }
        }
    }

    #[test]
    fn training_is_reproducible_with_fixed_seeds() {
        let training = tiny_training();
        let cfg = TrainConfig {
            epochs: 4,
            learning_rate: 0.1,
        };

        let run = || {
            let mut model = Model::new_with_seed(&tiny_cfg(), 3).unwrap();
            let mut rng = StdRng::seed_from_u64(99);
            let report = training.train(&mut model, &cfg, &mut rng).unwrap();
            (model, report)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn train_rejects_mismatched_model_and_bad_config() {
        let training = tiny_training();
        let mut rng = StdRng::seed_from_u64(0);

        let mut wrong = Model::zeros(&ModelConfig {
            hidden_size: 4,
            image_pixels: 5,
            num_labels: 2,
        })
        .unwrap();
        let err = training
            .train(&mut wrong, &TrainConfig::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));

        let mut model = Model::zeros(&tiny_cfg()).unwrap();
        let cfg = TrainConfig {
            epochs: 1,
            learning_rate: f32::NAN,
        };
        assert!(training.train(&mut model, &cfg, &mut rng).is_err());
    }

    #[test]
    fn training_rejects_empty_or_mismatched_sets() {
        let empty = Dataset::from_flat(vec![], vec![], 4, 2).unwrap();
        let one = Dataset::from_flat(vec![0.0; 4], vec![1.0, 0.0], 4, 2).unwrap();
        assert!(Training::new(empty.clone(), one.clone()).is_err());
        assert!(Training::new(one.clone(), empty).is_err());

        let wide = Dataset::from_flat(vec![0.0; 5], vec![1.0, 0.0], 5, 2).unwrap();
        assert!(Training::new(one, wide).is_err());
    }

    #[test]
    fn predict_without_dropout_is_deterministic() {
        let model = Model::new_with_seed(&tiny_cfg(), 5).unwrap();
        let inputs = Inputs::from_rows(&[vec![0.1, 0.2, 0.3, 0.4], vec![1.0, 0.0, 0.0, 0.0]])
            .unwrap();
        let cfg = PredictConfig {
            training_mode: false,
        };

        let a = model
            .predict(&inputs, &cfg, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = model
            .predict(&inputs, &cfg, &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[1], model.forward_without_dropout(inputs.input(1)).into_output());
    }

    #[test]
    fn predict_in_training_mode_uses_dropout_rng() {
        let model = Model::new_with_seed(&tiny_cfg(), 5).unwrap();
        let inputs = Inputs::from_rows(&[vec![0.1, 0.2, 0.3, 0.4]]).unwrap();
        let cfg = PredictConfig::default();

        let mut rng = StdRng::seed_from_u64(8);
        let got = model.predict(&inputs, &cfg, &mut rng).unwrap();

        let mut rng = StdRng::seed_from_u64(8);
        let expected = model.forward(inputs.input(0), &mut rng).into_output();
        assert_eq!(got, vec![expected]);

        let labels = model
            .predict_labels(&inputs, &cfg, &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(labels, vec![argmax(&got[0])]);
    }

    #[test]
    fn predict_rejects_wrong_width() {
        let model = Model::zeros(&tiny_cfg()).unwrap();
        let inputs = Inputs::from_rows(&[vec![0.0; 3]]).unwrap();
        let err = model
            .predict(&inputs, &PredictConfig::default(), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
    }
}
