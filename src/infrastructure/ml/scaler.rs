use crate::domain::housing::features::HousingFeatures;
use crate::domain::ml::feature_registry::{MODEL_FEATURES, engineered_vector};
use crate::domain::ports::FeatureTransform;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Training-time standard scaler over the engineered feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Checks the artifact against the column layout the server produces
    pub fn checked(self) -> Result<Self> {
        let expected: Vec<&str> = MODEL_FEATURES.to_vec();
        let actual: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        if actual != expected {
            bail!(
                "Scaler columns {:?} do not match model features {:?}",
                actual,
                expected
            );
        }
        if self.mean.len() != expected.len() || self.scale.len() != expected.len() {
            bail!(
                "Scaler vectors have {} means and {} scales, expected {}",
                self.mean.len(),
                self.scale.len(),
                expected.len()
            );
        }
        if let Some(idx) = self.scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            bail!("Scaler has unusable scale for {}", expected[idx]);
        }
        Ok(self)
    }

    /// Pass-through scaler (zero mean, unit scale)
    pub fn identity() -> Self {
        Self {
            feature_names: MODEL_FEATURES.iter().map(|s| s.to_string()).collect(),
            mean: vec![0.0; MODEL_FEATURES.len()],
            scale: vec![1.0; MODEL_FEATURES.len()],
        }
    }
}

impl FeatureTransform for StandardScaler {
    fn transform(&self, features: &HousingFeatures) -> Result<Vec<f64>, String> {
        let raw = engineered_vector(features, &self.mean);
        if raw.len() != self.mean.len() || raw.len() != self.scale.len() {
            return Err(format!(
                "feature vector has {} columns, scaler expects {}",
                raw.len(),
                self.mean.len()
            ));
        }

        let scaled: Vec<f64> = raw
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect();

        if let Some(idx) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(format!("non-finite value for {}", MODEL_FEATURES[idx]));
        }
        Ok(scaled)
    }
}
