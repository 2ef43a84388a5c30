//! Feature binding for ML inference
//!
//! Turns a free-form named FeatureSet into the dense, fixed-order numeric
//! row a domain's model consumes. Validation is fail-fast: every missing
//! name is reported before any value is coerced.

use super::error::PredictionError;
use crate::domain::Domain;
use crate::models::{FeatureSet, FeatureValue};

/// Names from the domain's feature order absent from `features`, in order
pub fn missing_features(domain: Domain, features: &FeatureSet) -> Vec<String> {
    domain
        .feature_order()
        .iter()
        .filter(|name| !features.contains(name))
        .map(|name| name.to_string())
        .collect()
}

/// Bind `features` to the positional row for `domain`
pub fn bind(domain: Domain, features: &FeatureSet) -> Result<Vec<f64>, PredictionError> {
    let missing = missing_features(domain, features);
    if !missing.is_empty() {
        return Err(PredictionError::MissingFeature {
            domain,
            fields: missing,
        });
    }

    let mut row = Vec::with_capacity(domain.feature_count());
    for name in domain.feature_order() {
        let value = features
            .get(name)
            .ok_or_else(|| PredictionError::MissingFeature {
                domain,
                fields: vec![name.to_string()],
            })?;
        let number = coerce(value).map_err(|reason| PredictionError::InvalidFeatureValue {
            domain,
            field: name.to_string(),
            value: display_value(value),
            reason,
        })?;
        row.push(number);
    }
    Ok(row)
}

/// Coerce a single value to a finite f64
pub fn coerce(value: &FeatureValue) -> Result<f64, String> {
    let number = match value {
        FeatureValue::Number(n) => *n,
        FeatureValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err("value is empty".to_string());
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| "value is not a number".to_string())?
        }
        FeatureValue::Other(serde_json::Value::Null) => {
            return Err("value is null".to_string())
        }
        FeatureValue::Other(_) => return Err("value is not a number".to_string()),
    };

    if !number.is_finite() {
        return Err("value is not finite".to_string());
    }
    Ok(number)
}

fn display_value(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Number(n) => n.to_string(),
        FeatureValue::Text(t) => t.clone(),
        FeatureValue::Other(other) => other.to_string(),
    }
}
