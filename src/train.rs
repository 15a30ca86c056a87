use rand::seq::SliceRandom;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::engine::Scratch;
use crate::metrics::{self, EVALUATION_EPOCH, WeightedTally};
use crate::{
    DynamicDeepLearningEngine, Error, Gradients, Result, TrainingMetrics, TrainingSample, data,
    loss,
};

impl DynamicDeepLearningEngine {
    /// Train with mini-batch gradient descent.
    ///
    /// Each epoch optionally shuffles the sample order with the engine's RNG,
    /// walks contiguous batches of `batch_size`, and applies one update per
    /// batch. Loss and accuracy are recorded per sample with the parameters in
    /// effect before that sample's batch update, weighted by sample weight.
    ///
    /// Every sample is validated before any parameter changes.
    ///
    /// Returns one [`TrainingMetrics`] per epoch, numbered from 1.
    pub fn train(
        &mut self,
        samples: &[TrainingSample],
        epochs: usize,
        batch_size: usize,
    ) -> Result<Vec<TrainingMetrics>> {
        self.validate_samples(samples)?;
        if batch_size == 0 {
            return Err(Error::InvalidData("batch_size must be > 0".to_owned()));
        }
        if epochs == 0 {
            return Err(Error::InvalidData("epochs must be > 0".to_owned()));
        }

        let output = self.spec.output_activation();
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut scratch = Scratch::new(&self.layers);
        let mut grads = Gradients::new(&self.layers);
        let mut history = Vec::with_capacity(epochs);

        for epoch in 1..=epochs {
            if self.spec.shuffle_training() {
                order.shuffle(&mut self.rng);
            }

            let mut tally = WeightedTally::default();
            for (batch_idx, batch) in order.chunks(batch_size).enumerate() {
                grads.clear();
                for &i in batch {
                    let sample = &samples[i];
                    let pred = self.forward_into(sample.features(), &mut scratch);
                    tally.record(
                        loss::sample_loss(output, pred, sample.target()),
                        metrics::is_correct(pred, sample.target()),
                        sample.weight(),
                    );

                    self.backprop(sample, &mut scratch, &mut grads);
                    grads.add_sample_weight(sample.weight());
                }

                self.apply_gradients(&mut grads);
                trace!(
                    epoch,
                    batch = batch_idx,
                    weight_sum = grads.weight_sum(),
                    "batch applied"
                );
            }

            let m = tally.finish(epoch);
            debug!(
                epoch,
                loss = m.loss,
                accuracy = m.accuracy,
                samples = m.sample_count,
                "epoch complete"
            );
            history.push(m);
        }

        info!(
            epochs,
            batch_size,
            final_loss = history.last().map(|m| m.loss),
            "training complete"
        );
        Ok(history)
    }

    /// [`train`](Self::train) on a mapping-form dataset.
    pub fn train_records(
        &mut self,
        records: &[Value],
        epochs: usize,
        batch_size: usize,
    ) -> Result<Vec<TrainingMetrics>> {
        let samples = data::coerce_samples(records)?;
        self.train(&samples, epochs, batch_size)
    }

    /// Weighted loss and accuracy over `samples` without touching parameters.
    ///
    /// The result has `epoch == 0` and the note `"evaluation"`.
    pub fn evaluate(&self, samples: &[TrainingSample]) -> Result<TrainingMetrics> {
        self.validate_samples(samples)?;

        let output = self.spec.output_activation();
        let mut tally = WeightedTally::default();
        for sample in samples {
            let pred = self.forward(sample.features());
            tally.record(
                loss::sample_loss(output, &pred, sample.target()),
                metrics::is_correct(&pred, sample.target()),
                sample.weight(),
            );
        }

        Ok(tally.finish(EVALUATION_EPOCH).with_note("evaluation"))
    }

    /// [`evaluate`](Self::evaluate) on a mapping-form dataset.
    pub fn evaluate_records(&self, records: &[Value]) -> Result<TrainingMetrics> {
        let samples = data::coerce_samples(records)?;
        self.evaluate(&samples)
    }

    /// Model output for one feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.check_features(features, || "features".to_owned())?;
        Ok(self.forward(features))
    }

    /// Model outputs for many feature vectors.
    ///
    /// Every row is validated before any output is computed.
    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        for (i, row) in rows.iter().enumerate() {
            self.check_features(row, || format!("row {i}"))?;
        }
        Ok(rows.iter().map(|row| self.forward(row)).collect())
    }

    /// `what` labels the vector in the error and is only built on mismatch.
    fn check_features(&self, features: &[f64], what: impl FnOnce() -> String) -> Result<()> {
        if features.len() != self.input_dim() {
            return Err(Error::InvalidShape(format!(
                "{} len {} does not match model input_dim {}",
                what(),
                features.len(),
                self.input_dim()
            )));
        }
        Ok(())
    }

    fn validate_samples(&self, samples: &[TrainingSample]) -> Result<()> {
        if samples.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        for (i, sample) in samples.iter().enumerate() {
            self.check_features(sample.features(), || format!("sample {i} features"))?;
            if sample.target().len() != self.output_dim() {
                return Err(Error::InvalidShape(format!(
                    "sample {i} target len {} does not match model output_dim {}",
                    sample.target().len(),
                    self.output_dim()
                )));
            }
        }
        Ok(())
    }
}
