use crate::domain::housing::features::HousingFeatures;
use crate::domain::ml::model::ActiveModel;
use anyhow::Result;

/// Point estimator over a scaled feature vector
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, String>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Frozen training-time feature transformation
pub trait FeatureTransform: Send + Sync {
    fn transform(&self, features: &HousingFeatures) -> Result<Vec<f64>, String>;
}

/// External source of the currently published model
pub trait ModelProvider: Send + Sync {
    /// Build a fresh `ActiveModel` from whatever the provider currently publishes
    fn load(&self) -> Result<ActiveModel>;

    /// Human-readable source, for logs
    fn source(&self) -> String;
}
