//! ONNX inference using tract
//!
//! Loads binary classifiers exported to ONNX (for example with
//! `skl2onnx` and `zipmap=False`). Output 0 must be the label tensor;
//! an optional output 1 holds the `[1, 2]` class-probability tensor.

use super::Classifier;
use crate::models::RawPrediction;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed classifier
pub struct OnnxClassifier {
    model: TractModel,
    n_features: usize,
    has_probabilities: bool,
}

impl OnnxClassifier {
    /// Parse, shape and optimize an ONNX model for a single-row input
    pub fn from_bytes(model_bytes: &[u8], n_features: usize) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        let has_probabilities = model.model().output_outlets()?.len() > 1;

        Ok(Self {
            model,
            n_features,
            has_probabilities,
        })
    }

    fn row_to_tensor(&self, row: &[f64]) -> Result<Tensor> {
        let data: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)
            .context("Feature row does not match model input shape")?;
        Ok(array.into())
    }
}

impl Classifier for OnnxClassifier {
    fn family(&self) -> &str {
        "onnx"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn supports_probability(&self) -> bool {
        self.has_probabilities
    }

    fn classify(&self, row: &[f64]) -> Result<RawPrediction> {
        let start = Instant::now();
        let input = self.row_to_tensor(row)?;

        let outputs = self.model.run(tvec!(input.into()))?;

        let label_tensor = outputs.first().context("No label output from model")?;
        let labels = label_tensor
            .cast_to::<i64>()
            .context("Label output is not an integer tensor")?;
        let label = *labels
            .as_slice::<i64>()?
            .first()
            .context("Label output is empty")?;

        let positive_probability = if self.has_probabilities {
            let proba = outputs.get(1).context("No probability output from model")?;
            let proba = proba
                .cast_to::<f64>()
                .context("Probability output is not a float tensor")?;
            let values = proba.as_slice::<f64>()?;
            Some(*values.get(1).context("Probability output has no positive class")?)
        } else {
            None
        };

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(RawPrediction {
            label,
            positive_probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `softmax([0, 0.05 * Glucose - 6])` over a diabetes row, with an ArgMax label
    const GLUCOSE_LOGISTIC: &[u8] = include_bytes!("../../resources/models/glucose_logistic.onnx");
    /// Same graph with only the label exported
    const GLUCOSE_LABEL_ONLY: &[u8] =
        include_bytes!("../../resources/models/glucose_label_only.onnx");

    fn diabetes_row(glucose: f64) -> Vec<f64> {
        vec![6.0, glucose, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]
    }

    #[test]
    fn test_label_and_probability_from_outputs() {
        let classifier = OnnxClassifier::from_bytes(GLUCOSE_LOGISTIC, 8).unwrap();
        assert_eq!(classifier.family(), "onnx");
        assert_eq!(classifier.n_features(), 8);
        assert!(classifier.supports_probability());

        let positive = classifier.classify(&diabetes_row(148.0)).unwrap();
        assert_eq!(positive.label, 1);
        let p = positive.positive_probability.unwrap();
        assert!((p - 0.8022).abs() < 1e-4, "probability {}", p);

        let negative = classifier.classify(&diabetes_row(85.0)).unwrap();
        assert_eq!(negative.label, 0);
        let p = negative.positive_probability.unwrap();
        assert!((p - 0.1480).abs() < 1e-4, "probability {}", p);
    }

    #[test]
    fn test_label_only_model_has_no_probability() {
        let classifier = OnnxClassifier::from_bytes(GLUCOSE_LABEL_ONLY, 8).unwrap();
        assert!(!classifier.supports_probability());

        let prediction = classifier.classify(&diabetes_row(148.0)).unwrap();
        assert_eq!(prediction.label, 1);
        assert_eq!(prediction.positive_probability, None);
    }

    #[test]
    fn test_wrong_input_width_fails_to_load() {
        assert!(OnnxClassifier::from_bytes(GLUCOSE_LOGISTIC, 13).is_err());
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let result = OnnxClassifier::from_bytes(b"definitely not a protobuf", 8);
        assert!(result.is_err());
    }
}
