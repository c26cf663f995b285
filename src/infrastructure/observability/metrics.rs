//! Prometheus metrics for the prediction service
//!
//! All metrics use the `housing_` prefix. Counters are atomic and only ever
//! increase; gauges are overwritten by the health monitor on each cycle.

use crate::domain::errors::ErrorKind;
use crate::domain::ml::model::ModelDescriptor;
use crate::domain::monitoring::health::{HealthSnapshot, HealthStatus};
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Content type of the text exposition format
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Rendered exposition document
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsDocument {
    pub content_type: &'static str,
    pub body: String,
}

/// Prometheus metrics for serving and drift monitoring
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Every request that reached the orchestrator
    pub requests_total: Counter,
    /// Successful predictions
    pub predictions_total: Counter,
    /// Errors by kind
    pub prediction_errors_total: CounterVec,
    /// One-hot health classification
    pub health_status: GaugeVec,
    pub error_rate: Gauge,
    pub feature_drift_score: GaugeVec,
    pub feature_drifted: GaugeVec,
    pub model_loaded: Gauge,
    pub model_info: GaugeVec,
    pub uptime_seconds: Gauge,
    /// Estimator latency
    pub prediction_latency_seconds: Histogram,
    /// End-to-end request duration by terminal outcome
    pub request_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = Counter::with_opts(Opts::new(
            "housing_requests_total",
            "Prediction requests received",
        ))?;
        registry.register(Box::new(requests_total.clone()))?;

        let predictions_total = Counter::with_opts(Opts::new(
            "housing_predictions_total",
            "Successful predictions",
        ))?;
        registry.register(Box::new(predictions_total.clone()))?;

        let prediction_errors_total = CounterVec::new(
            Opts::new("housing_prediction_errors_total", "Errors by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(prediction_errors_total.clone()))?;

        let health_status = GaugeVec::new(
            Opts::new(
                "housing_health_status",
                "Current health classification (1 for the active status)",
            ),
            &["status"],
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let error_rate = Gauge::with_opts(Opts::new(
            "housing_error_rate",
            "Error rate over the health window (0-1)",
        ))?;
        registry.register(Box::new(error_rate.clone()))?;

        let feature_drift_score = GaugeVec::new(
            Opts::new(
                "housing_feature_drift_score",
                "Drift score per input feature",
            ),
            &["feature"],
        )?;
        registry.register(Box::new(feature_drift_score.clone()))?;

        let feature_drifted = GaugeVec::new(
            Opts::new(
                "housing_feature_drifted",
                "Whether the feature exceeds its drift threshold (0/1)",
            ),
            &["feature"],
        )?;
        registry.register(Box::new(feature_drifted.clone()))?;

        let model_loaded = Gauge::with_opts(Opts::new(
            "housing_model_loaded",
            "Whether a model is loaded (0/1)",
        ))?;
        registry.register(Box::new(model_loaded.clone()))?;

        let model_info = GaugeVec::new(
            Opts::new("housing_model_info", "Active model identity"),
            &["model_id", "version"],
        )?;
        registry.register(Box::new(model_info.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "housing_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let prediction_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "housing_prediction_latency_seconds",
                "Estimator latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5,
            ]),
        )?;
        registry.register(Box::new(prediction_latency_seconds.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "housing_request_duration_seconds",
                "End-to-end request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["outcome"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        let metrics = Self {
            registry: Arc::new(registry),
            requests_total,
            predictions_total,
            prediction_errors_total,
            health_status,
            error_rate,
            feature_drift_score,
            feature_drifted,
            model_loaded,
            model_info,
            uptime_seconds,
            prediction_latency_seconds,
            request_duration_seconds,
        };

        // Expose every error kind at zero from the start
        for kind in ErrorKind::ALL {
            metrics.prediction_errors_total.with_label_values(&[kind.label()]);
        }

        Ok(metrics)
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> MetricsDocument {
        MetricsDocument {
            content_type: METRICS_CONTENT_TYPE,
            body: self.render(),
        }
    }

    pub fn inc_error(&self, kind: ErrorKind) {
        self.prediction_errors_total
            .with_label_values(&[kind.label()])
            .inc();
    }

    pub fn error_count(&self, kind: ErrorKind) -> f64 {
        self.prediction_errors_total
            .with_label_values(&[kind.label()])
            .get()
    }

    /// Publish the active model, or its absence
    pub fn set_model(&self, model: Option<&ModelDescriptor>) {
        self.model_info.reset();
        match model {
            Some(descriptor) => {
                self.model_loaded.set(1.0);
                self.model_info
                    .with_label_values(&[descriptor.model_id.as_str(), descriptor.version.as_str()])
                    .set(1.0);
            }
            None => self.model_loaded.set(0.0),
        }
    }

    /// Overwrite the health gauges from a fresh snapshot
    pub fn publish_health(&self, snapshot: &HealthSnapshot) {
        for status in HealthStatus::ALL {
            let value = if status == snapshot.status { 1.0 } else { 0.0 };
            self.health_status
                .with_label_values(&[status.as_str()])
                .set(value);
        }
        self.error_rate.set(snapshot.error_rate);

        for drift in &snapshot.feature_drift {
            let labels = [drift.feature.as_str()];
            match drift.score {
                Some(score) => self.feature_drift_score.with_label_values(&labels).set(score),
                None => {
                    let _ = self.feature_drift_score.remove_label_values(&labels);
                }
            }
            self.feature_drifted
                .with_label_values(&labels)
                .set(if drift.drifted { 1.0 } else { 0.0 });
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default Metrics")
    }
}
