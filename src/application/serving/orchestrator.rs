use crate::application::ml::predictor_gateway::PredictorGateway;
use crate::application::monitoring::event_recorder::EventRecorder;
use crate::domain::errors::{ErrorKind, PredictionError, ValidationCode, ValidationError};
use crate::domain::housing::features::HousingFeatures;
use crate::domain::housing::validation::Validator;
use crate::domain::ml::model::{ActiveModel, ConfidenceInterval, PredictionOutcome};
use crate::domain::monitoring::event::PredictionEvent;
use crate::infrastructure::observability::latency_tracker::LatencyGuard;
use crate::infrastructure::observability::metrics::Metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Lifecycle of one prediction request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Received,
    Validated,
    Predicted,
    Recorded,
    Responded,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal request transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: RequestState,
    pub to: RequestState,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Responded | RequestState::Rejected | RequestState::Failed
        )
    }

    pub fn can_advance_to(&self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Rejected)
                | (Validated, Predicted)
                | (Validated, Failed)
                | (Predicted, Recorded)
                // recording failed; the response is still sent
                | (Predicted, Responded)
                | (Recorded, Responded)
        )
    }

    pub fn advance(self, next: RequestState) -> Result<RequestState, IllegalTransition> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Body of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub predicted_value: f64,
    pub model_id: String,
    pub model_version: String,
    pub latency_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub confidence_interval: ConfidenceInterval,
    /// The event could not be persisted
    pub degraded_observability: bool,
    pub event_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServeOutcome {
    Responded(PredictionResponse),
    Rejected(ValidationError),
    Failed(PredictionError),
}

impl ServeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ServeOutcome::Responded(_) => "responded",
            ServeOutcome::Rejected(_) => "rejected",
            ServeOutcome::Failed(_) => "failed",
        }
    }
}

/// Outcome plus the states the request went through
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    pub outcome: ServeOutcome,
    pub trace: Vec<RequestState>,
}

impl Served {
    pub fn final_state(&self) -> RequestState {
        self.trace.last().copied().unwrap_or(RequestState::Received)
    }
}

struct Transitions {
    trace: Vec<RequestState>,
}

impl Transitions {
    fn new() -> Self {
        Self {
            trace: vec![RequestState::Received],
        }
    }

    fn current(&self) -> RequestState {
        self.trace.last().copied().unwrap_or(RequestState::Received)
    }

    fn to(&mut self, next: RequestState) {
        match self.current().advance(next) {
            Ok(state) => self.trace.push(state),
            // Programming error; keep serving but make it loud
            Err(e) => error!("PredictionService: {}", e),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ServingConfig {
    pub prediction_timeout: Duration,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            prediction_timeout: Duration::from_millis(500),
        }
    }
}

/// Drives one request through validation, inference and recording
pub struct PredictionService {
    validator: Validator,
    gateway: Arc<PredictorGateway>,
    recorder: Arc<EventRecorder>,
    metrics: Metrics,
    config: ServingConfig,
}

impl PredictionService {
    pub fn new(
        validator: Validator,
        gateway: Arc<PredictorGateway>,
        recorder: Arc<EventRecorder>,
        metrics: Metrics,
        config: ServingConfig,
    ) -> Self {
        Self {
            validator,
            gateway,
            recorder,
            metrics,
            config,
        }
    }

    pub fn gateway(&self) -> &Arc<PredictorGateway> {
        &self.gateway
    }

    pub fn recorder(&self) -> &Arc<EventRecorder> {
        &self.recorder
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn serve(&self, payload: &Value) -> Served {
        self.run(|validator| validator.validate_value(payload)).await
    }

    /// Like `serve`, for a raw request body. Malformed JSON is a rejection.
    pub async fn serve_body(&self, body: &[u8]) -> Served {
        self.run(|validator| match serde_json::from_slice::<Value>(body) {
            Ok(payload) => validator.validate_value(&payload),
            Err(e) => Err(ValidationError::new(
                ValidationCode::InvalidPayload,
                None,
                format!("Malformed JSON body: {}", e),
            )),
        })
        .await
    }

    async fn run<F>(&self, validate: F) -> Served
    where
        F: FnOnce(&Validator) -> Result<HousingFeatures, ValidationError>,
    {
        self.metrics.requests_total.inc();
        let mut timer = LatencyGuard::new(self.metrics.request_duration_seconds.clone());
        let mut states = Transitions::new();

        let features = match validate(&self.validator) {
            Ok(features) => features,
            Err(e) => {
                debug!("PredictionService: rejected request: {}", e);
                self.metrics.inc_error(ErrorKind::Validation);
                states.to(RequestState::Rejected);
                let outcome = ServeOutcome::Rejected(e);
                timer.set_outcome(outcome.label());
                return Served {
                    outcome,
                    trace: states.trace,
                };
            }
        };
        states.to(RequestState::Validated);

        let started = Instant::now();
        let model = self.gateway.current();
        let descriptor = model.as_ref().map(|m| m.descriptor.clone());
        let result = match model {
            Some(model) => self.run_inference(model, features).await,
            None => Err(PredictionError::ModelUnavailable),
        };

        let outcome = match result {
            Ok(prediction) => {
                self.metrics.predictions_total.inc();
                self.metrics
                    .prediction_latency_seconds
                    .observe(prediction.latency.as_secs_f64());
                states.to(RequestState::Predicted);

                let event = PredictionEvent::success(features, &prediction);
                let degraded = match self.recorder.record(&event).await {
                    Ok(()) => {
                        states.to(RequestState::Recorded);
                        false
                    }
                    Err(_) => {
                        self.metrics.inc_error(ErrorKind::Persistence);
                        true
                    }
                };
                states.to(RequestState::Responded);
                ServeOutcome::Responded(response(&prediction, &event, degraded))
            }
            Err(err) => {
                warn!("PredictionService: prediction failed: {}", err);
                self.metrics.inc_error(ErrorKind::from(&err));

                let event =
                    PredictionEvent::failure(features, &err, descriptor.as_ref(), started.elapsed());
                if self.recorder.record(&event).await.is_err() {
                    self.metrics.inc_error(ErrorKind::Persistence);
                }
                states.to(RequestState::Failed);
                ServeOutcome::Failed(err)
            }
        };

        timer.set_outcome(outcome.label());
        Served {
            outcome,
            trace: states.trace,
        }
    }

    /// Estimator call on the blocking pool, bounded by the prediction timeout
    async fn run_inference(
        &self,
        model: Arc<ActiveModel>,
        features: HousingFeatures,
    ) -> Result<PredictionOutcome, PredictionError> {
        let task =
            tokio::task::spawn_blocking(move || PredictorGateway::predict_with(&model, &features));

        match tokio::time::timeout(self.config.prediction_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                error!("PredictionService: inference task aborted: {}", join_err);
                Err(PredictionError::inference("inference task aborted"))
            }
            Err(_) => Err(PredictionError::inference(format!(
                "timed out after {}ms",
                self.config.prediction_timeout.as_millis()
            ))),
        }
    }
}

fn response(
    prediction: &PredictionOutcome,
    event: &PredictionEvent,
    degraded_observability: bool,
) -> PredictionResponse {
    PredictionResponse {
        predicted_value: prediction.predicted_value,
        model_id: prediction.model_id.clone(),
        model_version: prediction.model_version.clone(),
        latency_ms: prediction.latency_ms(),
        timestamp: event.timestamp,
        confidence_interval: prediction.interval,
        degraded_observability,
        event_id: event.event_id,
    }
}
