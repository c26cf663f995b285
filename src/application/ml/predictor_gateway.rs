use crate::domain::errors::PredictionError;
use crate::domain::housing::features::HousingFeatures;
use crate::domain::ml::model::{ActiveModel, ConfidenceInterval, ModelDescriptor, PredictionOutcome};
use crate::domain::ports::ModelProvider;
use anyhow::{Context, Result};
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Longest estimator message passed through to callers
const MAX_REASON_LEN: usize = 200;

/// Estimator messages can carry matrices or paths; keep the first line only.
fn sanitize(reason: &str) -> String {
    let line = reason.lines().next().unwrap_or_default().trim();
    if line.chars().count() > MAX_REASON_LEN {
        let cut: String = line.chars().take(MAX_REASON_LEN).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

/// Holds the active model and runs inference against it.
///
/// The model slot is swapped wholesale; an inference that already loaded the
/// previous `Arc` finishes on it.
pub struct PredictorGateway {
    active: ArcSwapOption<ActiveModel>,
    provider: Option<Arc<dyn ModelProvider>>,
}

impl PredictorGateway {
    pub fn new() -> Self {
        Self {
            active: ArcSwapOption::empty(),
            provider: None,
        }
    }

    pub fn with_provider(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            active: ArcSwapOption::empty(),
            provider: Some(provider),
        }
    }

    /// Make `model` the active model
    pub fn install(&self, model: ActiveModel) -> Arc<ActiveModel> {
        let model = Arc::new(model);
        self.active.store(Some(model.clone()));
        info!(
            "PredictorGateway: active model is now {} v{}",
            model.descriptor.model_id, model.descriptor.version
        );
        model
    }

    /// Load from the provider and swap in. On failure the current model stays.
    pub fn reload(&self) -> Result<Arc<ActiveModel>> {
        let provider = self
            .provider
            .as_ref()
            .context("No model provider configured")?;
        match provider.load() {
            Ok(model) => Ok(self.install(model)),
            Err(e) => {
                warn!(
                    "PredictorGateway: reload from {} failed, keeping current model: {:#}",
                    provider.source(),
                    e
                );
                Err(e)
            }
        }
    }

    pub fn unload(&self) {
        self.active.store(None);
        info!("PredictorGateway: model unloaded");
    }

    pub fn current(&self) -> Option<Arc<ActiveModel>> {
        self.active.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.active.load().is_some()
    }

    pub fn descriptor(&self) -> Option<ModelDescriptor> {
        self.active.load().as_ref().map(|m| m.descriptor.clone())
    }

    /// Predict with whatever model is active right now
    pub fn predict(&self, features: &HousingFeatures) -> Result<PredictionOutcome, PredictionError> {
        let model = self.current().ok_or(PredictionError::ModelUnavailable)?;
        Self::predict_with(&model, features)
    }

    /// Transform and estimate on a specific model snapshot
    pub fn predict_with(
        model: &ActiveModel,
        features: &HousingFeatures,
    ) -> Result<PredictionOutcome, PredictionError> {
        let start = Instant::now();

        let vector = model
            .transform
            .transform(features)
            .map_err(|e| PredictionError::inference(sanitize(&e)))?;
        let value = model
            .regressor
            .predict(&vector)
            .map_err(|e| PredictionError::inference(sanitize(&e)))?;

        let latency = start.elapsed();

        if !value.is_finite() {
            return Err(PredictionError::inference(format!(
                "estimator returned non-finite value {}",
                value
            )));
        }

        Ok(PredictionOutcome {
            predicted_value: value,
            model_id: model.descriptor.model_id.clone(),
            model_version: model.descriptor.version.clone(),
            latency,
            interval: ConfidenceInterval::around(value),
        })
    }
}

impl Default for PredictorGateway {
    fn default() -> Self {
        Self::new()
    }
}
