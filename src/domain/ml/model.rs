use crate::domain::monitoring::baseline::BaselineDistribution;
use crate::domain::ports::{FeatureTransform, Regressor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Estimator families the file-backed provider knows how to deserialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    LinearRegression,
    RandomForest,
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorKind::LinearRegression => write!(f, "linear_regression"),
            EstimatorKind::RandomForest => write!(f, "random_forest"),
        }
    }
}

/// Identity of the active model, as published by the model provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_id: String,
    pub name: String,
    pub version: String,
    pub estimator: EstimatorKind,
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// e.g. `rmse`, `mae`, `r2`
    #[serde(default)]
    pub training_metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    /// Hex SHA-256 of the estimator artifact, filled in at load time
    #[serde(default)]
    pub artifact_sha256: Option<String>,
}

/// A loaded model: descriptor, frozen transform, estimator and drift reference.
///
/// Never mutated after construction; reloads build a new one.
pub struct ActiveModel {
    pub descriptor: ModelDescriptor,
    pub transform: Box<dyn FeatureTransform>,
    pub regressor: Box<dyn Regressor>,
    pub baseline: Option<Arc<BaselineDistribution>>,
}

impl ActiveModel {
    pub fn new(
        descriptor: ModelDescriptor,
        transform: Box<dyn FeatureTransform>,
        regressor: Box<dyn Regressor>,
    ) -> Self {
        Self {
            descriptor,
            transform,
            regressor,
            baseline: None,
        }
    }

    pub fn with_baseline(mut self, baseline: BaselineDistribution) -> Self {
        self.baseline = Some(Arc::new(baseline));
        self
    }
}

impl fmt::Debug for ActiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveModel")
            .field("descriptor", &self.descriptor)
            .field("regressor", &self.regressor.name())
            .field("baseline", &self.baseline.is_some())
            .finish()
    }
}

/// Relative half-width of the reported interval around a point estimate
pub const INTERVAL_HALF_WIDTH: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn around(estimate: f64) -> Self {
        let a = estimate * (1.0 - INTERVAL_HALF_WIDTH);
        let b = estimate * (1.0 + INTERVAL_HALF_WIDTH);
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }
}

/// Result of one successful inference
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub predicted_value: f64,
    pub model_id: String,
    pub model_version: String,
    pub latency: Duration,
    pub interval: ConfidenceInterval,
}

impl PredictionOutcome {
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}
