use crate::domain::errors::PredictionError;
use crate::domain::housing::features::HousingFeatures;
use crate::domain::ml::model::{ModelDescriptor, PredictionOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Model version recorded when no model was loaded at serving time
pub const UNKNOWN_MODEL_VERSION: &str = "unknown";

/// Current time truncated to the store's microsecond resolution
pub fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// One inference, as appended to the event log. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub features: HousingFeatures,
    pub prediction: Option<f64>,
    pub model_id: Option<String>,
    pub model_version: String,
    pub latency_ms: f64,
    pub success: bool,
    pub error_code: Option<String>,
    pub error_detail: Option<String>,
}

impl PredictionEvent {
    pub fn success(features: HousingFeatures, outcome: &PredictionOutcome) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: now_micros(),
            features,
            prediction: Some(outcome.predicted_value),
            model_id: Some(outcome.model_id.clone()),
            model_version: outcome.model_version.clone(),
            latency_ms: outcome.latency_ms(),
            success: true,
            error_code: None,
            error_detail: None,
        }
    }

    pub fn failure(
        features: HousingFeatures,
        error: &PredictionError,
        model: Option<&ModelDescriptor>,
        latency: Duration,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: now_micros(),
            features,
            prediction: None,
            model_id: model.map(|m| m.model_id.clone()),
            model_version: model
                .map(|m| m.version.clone())
                .unwrap_or_else(|| UNKNOWN_MODEL_VERSION.to_string()),
            latency_ms: latency.as_secs_f64() * 1000.0,
            success: false,
            error_code: Some(error.code().to_string()),
            error_detail: Some(error.to_string()),
        }
    }

    /// Re-stamp an event (backfills and fixtures)
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Selection over the event log. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub model_version: Option<String>,
    /// Keep only the newest N matches (still yielded oldest first)
    pub latest: Option<usize>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = Some(version.into());
        self
    }

    pub fn latest(mut self, n: usize) -> Self {
        self.latest = Some(n);
        self
    }

    pub fn matches(&self, event: &PredictionEvent) -> bool {
        self.since.is_none_or(|s| event.timestamp >= s)
            && self.until.is_none_or(|u| event.timestamp <= u)
            && self
                .model_version
                .as_ref()
                .is_none_or(|v| &event.model_version == v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_failure_without_model_uses_unknown_version() {
        let event = PredictionEvent::failure(
            HousingFeatures::default(),
            &PredictionError::ModelUnavailable,
            None,
            Duration::ZERO,
        );
        assert!(!event.success);
        assert_eq!(event.model_version, UNKNOWN_MODEL_VERSION);
        assert_eq!(event.error_code.as_deref(), Some("model_unavailable"));
        assert!(event.prediction.is_none());
    }

    #[test]
    fn test_timestamps_have_microsecond_resolution() {
        let ts = now_micros();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_filter_bounds_inclusive() {
        let base = now_micros();
        let event = PredictionEvent::failure(
            HousingFeatures::default(),
            &PredictionError::ModelUnavailable,
            None,
            Duration::ZERO,
        )
        .at(base);

        assert!(EventFilter::all().since(base).until(base).matches(&event));
        assert!(
            !EventFilter::all()
                .since(base + ChronoDuration::microseconds(1))
                .matches(&event)
        );
        assert!(!EventFilter::all().model_version("2.0.0").matches(&event));
    }
}
