//! Native model families deserialized from JSON artifacts
//!
//! These cover the classifier families commonly exported for tabular
//! medical data: logistic regression (optionally with a standard scaler),
//! linear SVM, a single decision tree, and a random forest. Parameters
//! are validated once at load time so inference never indexes out of
//! bounds.

use super::Classifier;
use crate::models::RawPrediction;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

fn default_threshold() -> f64 {
    0.5
}

/// A model artifact tagged by its family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum NativeModel {
    LogisticRegression(LogisticRegression),
    LinearSvm(LinearSvm),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl NativeModel {
    /// Parse and validate an artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let model: NativeModel = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            NativeModel::LogisticRegression(m) => m.validate(),
            NativeModel::LinearSvm(m) => m.validate(),
            NativeModel::DecisionTree(m) => m.validate(),
            NativeModel::RandomForest(m) => m.validate(),
        }
    }
}

impl Classifier for NativeModel {
    fn family(&self) -> &str {
        match self {
            NativeModel::LogisticRegression(_) => "logistic_regression",
            NativeModel::LinearSvm(_) => "linear_svm",
            NativeModel::DecisionTree(_) => "decision_tree",
            NativeModel::RandomForest(_) => "random_forest",
        }
    }

    fn n_features(&self) -> usize {
        match self {
            NativeModel::LogisticRegression(m) => m.coefficients.len(),
            NativeModel::LinearSvm(m) => m.coefficients.len(),
            NativeModel::DecisionTree(m) => m.n_features,
            NativeModel::RandomForest(m) => m.n_features,
        }
    }

    fn supports_probability(&self) -> bool {
        !matches!(self, NativeModel::LinearSvm(_))
    }

    fn classify(&self, row: &[f64]) -> Result<RawPrediction> {
        ensure!(
            row.len() == self.n_features(),
            "row has {} values, model expects {}",
            row.len(),
            self.n_features()
        );
        Ok(match self {
            NativeModel::LogisticRegression(m) => m.predict(row),
            NativeModel::LinearSvm(m) => m.predict(row),
            NativeModel::DecisionTree(m) => {
                let p = m.positive_probability(row);
                RawPrediction {
                    label: (p > 0.5) as i64,
                    positive_probability: Some(p),
                }
            }
            NativeModel::RandomForest(m) => m.predict(row),
        })
    }
}

/// Per-column standardization applied before a linear model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.mean.len() != n_features || self.scale.len() != n_features {
            return Err(format!(
                "scaler has {}/{} entries, expected {}",
                self.mean.len(),
                self.scale.len(),
                n_features
            ));
        }
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err("scaler mean contains non-finite values".to_string());
        }
        if self.scale.iter().any(|v| !v.is_finite() || *v == 0.0) {
            return Err("scaler scale must be finite and non-zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), String> {
        validate_linear(&self.coefficients, self.intercept)?;
        if let Some(scaler) = &self.scaler {
            scaler.validate(self.coefficients.len())?;
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!("threshold {} outside [0, 1]", self.threshold));
        }
        Ok(())
    }

    fn predict(&self, row: &[f64]) -> RawPrediction {
        let z = match &self.scaler {
            Some(scaler) => linear_score(&self.coefficients, self.intercept, &scaler.transform(row)),
            None => linear_score(&self.coefficients, self.intercept, row),
        };
        let p = sigmoid(z);
        RawPrediction {
            label: (p > self.threshold) as i64,
            positive_probability: Some(p),
        }
    }
}

/// Linear SVM; exposes a hard label only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearSvm {
    fn validate(&self) -> Result<(), String> {
        validate_linear(&self.coefficients, self.intercept)
    }

    fn predict(&self, row: &[f64]) -> RawPrediction {
        let decision = linear_score(&self.coefficients, self.intercept, row);
        RawPrediction {
            label: (decision > 0.0) as i64,
            positive_probability: None,
        }
    }
}

/// A node of a binary decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class weights `[negative, positive]`
    Leaf { value: [f64; 2] },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("tree declares zero features".to_string());
        }
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(format!("node {} splits on feature {}", idx, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    // Children must point forward, which also rules out cycles
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("leaf {} has invalid weights", idx));
                    }
                    if value[0] + value[1] <= 0.0 {
                        return Err(format!("leaf {} has zero total weight", idx));
                    }
                }
            }
        }
        Ok(())
    }

    fn positive_probability(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => return value[1] / (value[0] + value[1]),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features != self.n_features {
                return Err(format!(
                    "tree {} declares {} features, forest declares {}",
                    i, tree.n_features, self.n_features
                ));
            }
            tree.validate().map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    fn predict(&self, row: &[f64]) -> RawPrediction {
        let sum: f64 = self
            .trees
            .iter()
            .map(|t| t.positive_probability(row))
            .sum();
        let p = sum / self.trees.len() as f64;
        RawPrediction {
            label: (p > 0.5) as i64,
            positive_probability: Some(p),
        }
    }
}

fn validate_linear(coefficients: &[f64], intercept: f64) -> Result<(), String> {
    if coefficients.is_empty() {
        return Err("model has no coefficients".to_string());
    }
    if coefficients.iter().any(|c| !c.is_finite()) || !intercept.is_finite() {
        return Err("model parameters must be finite".to_string());
    }
    Ok(())
}

fn linear_score(coefficients: &[f64], intercept: f64, row: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(row)
        .map(|(w, x)| w * x)
        .sum::<f64>()
        + intercept
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<NativeModel, String> {
        NativeModel::from_json(value.to_string().as_bytes())
    }

    #[test]
    fn test_logistic_regression_probability_and_label_agree() {
        let model = parse(json!({
            "family": "logistic_regression",
            "coefficients": [1.0, -1.0],
            "intercept": 0.0
        }))
        .unwrap();

        let high = model.classify(&[3.0, 0.0]).unwrap();
        assert_eq!(high.label, 1);
        assert!(high.positive_probability.unwrap() > 0.9);

        let low = model.classify(&[0.0, 3.0]).unwrap();
        assert_eq!(low.label, 0);
        assert!(low.positive_probability.unwrap() < 0.1);

        // Exactly on the boundary the negative class wins
        let edge = model.classify(&[1.0, 1.0]).unwrap();
        assert_eq!(edge.positive_probability, Some(0.5));
        assert_eq!(edge.label, 0);
    }

    #[test]
    fn test_logistic_regression_applies_scaler() {
        let model = parse(json!({
            "family": "logistic_regression",
            "coefficients": [2.0],
            "intercept": 0.0,
            "scaler": { "mean": [100.0], "scale": [10.0] }
        }))
        .unwrap();

        let at_mean = model.classify(&[100.0]).unwrap();
        assert!((at_mean.positive_probability.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(model.classify(&[130.0]).unwrap().label, 1);
    }

    #[test]
    fn test_sigmoid_is_stable_for_large_inputs() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_linear_svm_has_no_probability() {
        let model = parse(json!({
            "family": "linear_svm",
            "coefficients": [1.0, 1.0],
            "intercept": -1.0
        }))
        .unwrap();

        assert!(!model.supports_probability());
        let out = model.classify(&[1.0, 1.0]).unwrap();
        assert_eq!(out.label, 1);
        assert_eq!(out.positive_probability, None);
        assert_eq!(model.classify(&[0.0, 0.0]).unwrap().label, 0);
    }

    #[test]
    fn test_decision_tree_routes_left_on_equal() {
        let model = parse(json!({
            "family": "decision_tree",
            "n_features": 2,
            "nodes": [
                { "feature": 1, "threshold": 120.0, "left": 1, "right": 2 },
                { "value": [9.0, 1.0] },
                { "value": [1.0, 3.0] }
            ]
        }))
        .unwrap();

        let left = model.classify(&[0.0, 120.0]).unwrap();
        assert_eq!(left.label, 0);
        assert!((left.positive_probability.unwrap() - 0.1).abs() < 1e-12);

        let right = model.classify(&[0.0, 150.0]).unwrap();
        assert_eq!(right.label, 1);
        assert!((right.positive_probability.unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_random_forest_averages_trees() {
        let model = parse(json!({
            "family": "random_forest",
            "n_features": 1,
            "trees": [
                { "n_features": 1, "nodes": [{ "value": [0.0, 1.0] }] },
                { "n_features": 1, "nodes": [{ "value": [1.0, 1.0] }] }
            ]
        }))
        .unwrap();

        let out = model.classify(&[42.0]).unwrap();
        assert!((out.positive_probability.unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(out.label, 1);
    }

    #[test]
    fn test_rejects_backward_child_pointer() {
        let err = parse(json!({
            "family": "decision_tree",
            "n_features": 1,
            "nodes": [
                { "feature": 0, "threshold": 1.0, "left": 0, "right": 1 },
                { "value": [1.0, 0.0] }
            ]
        }))
        .unwrap_err();
        assert!(err.contains("invalid child"), "{}", err);
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let err = parse(json!({
            "family": "decision_tree",
            "n_features": 1,
            "nodes": [
                { "feature": 3, "threshold": 1.0, "left": 1, "right": 2 },
                { "value": [1.0, 0.0] },
                { "value": [0.0, 1.0] }
            ]
        }))
        .unwrap_err();
        assert!(err.contains("feature 3"), "{}", err);
    }

    #[test]
    fn test_rejects_mismatched_scaler() {
        let err = parse(json!({
            "family": "logistic_regression",
            "coefficients": [1.0, 2.0],
            "intercept": 0.0,
            "scaler": { "mean": [0.0], "scale": [1.0] }
        }))
        .unwrap_err();
        assert!(err.contains("scaler"), "{}", err);
    }

    #[test]
    fn test_rejects_unknown_family() {
        assert!(parse(json!({ "family": "neural_net", "layers": [] })).is_err());
    }

    #[test]
    fn test_classify_rejects_wrong_row_length() {
        let model = parse(json!({
            "family": "linear_svm",
            "coefficients": [1.0, 1.0],
            "intercept": 0.0
        }))
        .unwrap();
        assert!(model.classify(&[1.0]).is_err());
    }
}
