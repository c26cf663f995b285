//! HTTP surface of the prediction service
//!
//! Thin axum handlers over the orchestrator, the health monitor and the
//! metrics registry. Status mapping lives in [`ApiError`].

use crate::application::monitoring::health_monitor::HealthMonitor;
use crate::application::monitoring::prediction_stats::{
    PredictionStats, lookback_start, prediction_stats,
};
use crate::application::serving::orchestrator::{
    PredictionResponse, PredictionService, ServeOutcome,
};
use crate::domain::errors::PredictionError;
use crate::domain::ml::model::ModelDescriptor;
use crate::domain::monitoring::health::HealthSnapshot;
use crate::interfaces::error::{ApiError, ApiResult};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Days covered by `/monitoring/stats` when none are given
pub const DEFAULT_STATS_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub monitor: Arc<HealthMonitor>,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, monitor: Arc<HealthMonitor>) -> Self {
        Self { service, monitor }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/model/info", get(model_info))
        .route("/model/reload", post(reload_model))
        .route("/monitoring/stats", get(stats))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "California Housing Price Predictor API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "predict": "/predict",
            "health": "/health",
            "model_info": "/model/info",
            "model_reload": "/model/reload",
            "stats": "/monitoring/stats",
            "metrics": "/metrics",
        }
    }))
}

async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PredictionResponse>> {
    let served = state.service.serve_body(&body).await;
    match served.outcome {
        ServeOutcome::Responded(response) => Ok(Json(response)),
        ServeOutcome::Rejected(e) => Err(e.into()),
        ServeOutcome::Failed(e) => Err(e.into()),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ready: bool,
    pub model: Option<ModelDescriptor>,
    pub snapshot: Option<HealthSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_error: Option<String>,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let model = state.service.gateway().descriptor();
    let (snapshot, snapshot_error) = match state.monitor.current().await {
        Ok(snapshot) => (Some(snapshot.as_ref().clone()), None),
        Err(e) => {
            warn!("Health: snapshot unavailable: {}", e);
            (None, Some(e.to_string()))
        }
    };

    let ready = model.is_some();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            ready,
            model,
            snapshot,
            snapshot_error,
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub model_name: String,
    pub model_version: String,
    pub estimator: String,
    pub features: Vec<String>,
    pub performance_metrics: BTreeMap<String, f64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub artifact_sha256: Option<String>,
}

impl From<ModelDescriptor> for ModelInfo {
    fn from(d: ModelDescriptor) -> Self {
        Self {
            model_id: d.model_id,
            model_name: d.name,
            model_version: d.version,
            estimator: d.estimator.to_string(),
            features: d.feature_names,
            performance_metrics: d.training_metrics,
            last_updated: d.trained_at,
            artifact_sha256: d.artifact_sha256,
        }
    }
}

async fn model_info(State(state): State<AppState>) -> ApiResult<Json<ModelInfo>> {
    let descriptor = state
        .service
        .gateway()
        .descriptor()
        .ok_or(PredictionError::ModelUnavailable)?;
    Ok(Json(descriptor.into()))
}

async fn reload_model(State(state): State<AppState>) -> ApiResult<Json<ModelInfo>> {
    let gateway = state.service.gateway().clone();
    let reloaded = tokio::task::spawn_blocking(move || gateway.reload())
        .await
        .map_err(|e| {
            warn!("Model reload task aborted: {}", e);
            ApiError::ReloadFailed("reload task aborted".to_string())
        })?
        .map_err(|e| {
            warn!("Model reload failed: {:#}", e);
            ApiError::ReloadFailed("model artifacts could not be loaded".to_string())
        })?;

    state
        .service
        .metrics()
        .set_model(Some(&reloaded.descriptor));
    info!(
        "Model reloaded: {} v{}",
        reloaded.descriptor.model_id, reloaded.descriptor.version
    );
    Ok(Json(reloaded.descriptor.clone().into()))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub days: Option<i64>,
}

async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<PredictionStats>> {
    let days = query.days.unwrap_or(DEFAULT_STATS_DAYS);
    if days < 1 {
        return Err(ApiError::BadRequest(format!(
            "days must be at least 1, got {}",
            days
        )));
    }
    let now = Utc::now();
    if lookback_start(now, days).is_none() {
        return Err(ApiError::BadRequest(format!(
            "days is out of range, got {}",
            days
        )));
    }
    let stats = prediction_stats(state.service.recorder(), days, now).await?;
    Ok(Json(stats))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let document = state.service.metrics().snapshot();
    (
        [(header::CONTENT_TYPE, document.content_type)],
        document.body,
    )
}
