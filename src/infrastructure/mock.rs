//! Test doubles for the model and the event store

use crate::domain::errors::PersistenceError;
use crate::domain::housing::features::HousingFeatures;
use crate::domain::ml::model::{ActiveModel, EstimatorKind, ModelDescriptor};
use crate::domain::monitoring::event::{EventFilter, PredictionEvent};
use crate::domain::ports::{FeatureTransform, Regressor};
use crate::domain::repositories::PredictionEventRepository;
use crate::infrastructure::repositories::InMemoryPredictionEventRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Passes the eight raw inputs through unchanged
pub struct IdentityTransform;

impl FeatureTransform for IdentityTransform {
    fn transform(&self, features: &HousingFeatures) -> Result<Vec<f64>, String> {
        Ok(features.values().to_vec())
    }
}

pub struct FixedRegressor {
    value: f64,
}

impl FixedRegressor {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Regressor for FixedRegressor {
    fn predict(&self, _features: &[f64]) -> Result<f64, String> {
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Predicts the first input column (MedInc under `IdentityTransform`)
pub struct EchoRegressor;

impl Regressor for EchoRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64, String> {
        features
            .first()
            .copied()
            .ok_or_else(|| "empty feature vector".to_string())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Fails every `every`-th call, otherwise returns `value`
pub struct FailingRegressor {
    every: usize,
    value: f64,
    calls: AtomicUsize,
}

impl FailingRegressor {
    pub fn every(every: usize, value: f64) -> Self {
        Self {
            every: every.max(1),
            value,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always() -> Self {
        Self::every(1, 0.0)
    }
}

impl Regressor for FailingRegressor {
    fn predict(&self, _features: &[f64]) -> Result<f64, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call.is_multiple_of(self.every) {
            Err(format!(
                "estimator failure on call {}\n  at matrix [[1.0, 2.0], [3.0, 4.0]]",
                call
            ))
        } else {
            Ok(self.value)
        }
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Blocks the calling thread before answering
pub struct SlowRegressor {
    delay: Duration,
    value: f64,
}

impl SlowRegressor {
    pub fn new(delay: Duration, value: f64) -> Self {
        Self { delay, value }
    }
}

impl Regressor for SlowRegressor {
    fn predict(&self, _features: &[f64]) -> Result<f64, String> {
        std::thread::sleep(self.delay);
        Ok(self.value)
    }

    fn name(&self) -> &str {
        "slow"
    }
}

pub fn mock_descriptor(version: &str) -> ModelDescriptor {
    ModelDescriptor {
        model_id: "mock-model".to_string(),
        name: "Mock housing model".to_string(),
        version: version.to_string(),
        estimator: EstimatorKind::LinearRegression,
        feature_names: Vec::new(),
        training_metrics: BTreeMap::from([("rmse".to_string(), 0.5), ("r2".to_string(), 0.8)]),
        trained_at: None,
        artifact_sha256: None,
    }
}

/// Active model using `IdentityTransform` and the given estimator
pub fn model_with(version: &str, regressor: Box<dyn Regressor>) -> ActiveModel {
    ActiveModel::new(mock_descriptor(version), Box::new(IdentityTransform), regressor)
}

/// In-memory store whose writes take `delay`
pub struct SlowEventRepository {
    inner: InMemoryPredictionEventRepository,
    delay: Duration,
}

impl SlowEventRepository {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryPredictionEventRepository::new(),
            delay,
        }
    }
}

#[async_trait]
impl PredictionEventRepository for SlowEventRepository {
    async fn append(&self, event: &PredictionEvent) -> Result<(), PersistenceError> {
        tokio::time::sleep(self.delay).await;
        self.inner.append(event).await
    }

    fn query(
        &self,
        filter: EventFilter,
    ) -> BoxStream<'_, Result<PredictionEvent, PersistenceError>> {
        self.inner.query(filter)
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        self.inner.purge_before(cutoff).await
    }
}

/// Store that rejects every write
pub struct UnavailableEventRepository;

#[async_trait]
impl PredictionEventRepository for UnavailableEventRepository {
    async fn append(&self, _event: &PredictionEvent) -> Result<(), PersistenceError> {
        debug!("UnavailableEventRepository: rejecting write");
        Err(PersistenceError::Unavailable {
            reason: "disk full".to_string(),
        })
    }

    fn query(
        &self,
        _filter: EventFilter,
    ) -> BoxStream<'_, Result<PredictionEvent, PersistenceError>> {
        Box::pin(futures::stream::iter(vec![Err(
            PersistenceError::Unavailable {
                reason: "disk full".to_string(),
            },
        )]))
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        Ok(0)
    }
}
