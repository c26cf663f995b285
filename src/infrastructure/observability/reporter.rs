//! Push-based health reporter
//!
//! Periodically recomputes the health snapshot, refreshes the Prometheus
//! gauges and prints the snapshot as one structured JSON line to stdout.

use crate::application::ml::predictor_gateway::PredictorGateway;
use crate::application::monitoring::health_monitor::HealthMonitor;
use crate::domain::monitoring::health::HealthSnapshot;
use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Line prefix so log shippers can filter health reports
pub const HEALTH_JSON_PREFIX: &str = "HEALTH_JSON:";

/// One reporting cycle as emitted on stdout
#[derive(Serialize)]
pub struct HealthReport<'a> {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: &'static str,
    pub model_loaded: bool,
    pub model_version: Option<String>,
    pub health: &'a HealthSnapshot,
}

pub struct HealthReporter {
    monitor: Arc<HealthMonitor>,
    gateway: Arc<PredictorGateway>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl HealthReporter {
    /// * `interval_seconds` - How often to report (default: 60)
    pub fn new(
        monitor: Arc<HealthMonitor>,
        gateway: Arc<PredictorGateway>,
        metrics: Metrics,
        interval_seconds: u64,
    ) -> Self {
        Self {
            monitor,
            gateway,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop
    pub async fn run(self) {
        info!(
            "HealthReporter: Starting health cycle (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            match self.cycle().await {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("HealthReporter: cycle failed: {:#}", e),
            }
        }
    }

    /// Refresh health and gauges, returning the line to emit
    pub async fn cycle(&self) -> anyhow::Result<String> {
        let uptime = self.start_time.elapsed().as_secs();
        self.metrics.uptime_seconds.set(uptime as f64);
        let descriptor = self.gateway.descriptor();
        self.metrics.set_model(descriptor.as_ref());

        let snapshot = self.monitor.refresh().await?;
        let report = HealthReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION"),
            model_loaded: descriptor.is_some(),
            model_version: descriptor.map(|d| d.version),
            health: &snapshot,
        };

        info!(
            "Health: {} | Requests: {} | Error rate: {:.2}% | Drifted: {}",
            snapshot.status,
            snapshot.request_count,
            snapshot.error_rate * 100.0,
            snapshot.drifted_features
        );

        Ok(format!(
            "{}{}",
            HEALTH_JSON_PREFIX,
            serde_json::to_string(&report)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::monitoring::event_recorder::EventRecorder;
    use crate::application::monitoring::health_analyzer::HealthAnalyzer;
    use crate::domain::monitoring::window::WindowSpec;
    use crate::infrastructure::mock::{FixedRegressor, model_with};
    use crate::infrastructure::repositories::InMemoryPredictionEventRepository;

    #[tokio::test]
    async fn test_cycle_emits_prefixed_json() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        let gateway = Arc::new(PredictorGateway::new());
        gateway.install(model_with("2.1.0", Box::new(FixedRegressor::new(1.0))));
        let recorder = Arc::new(EventRecorder::new(
            Arc::new(InMemoryPredictionEventRepository::new()),
            Duration::from_millis(100),
        ));
        let monitor = Arc::new(HealthMonitor::new(
            recorder,
            gateway.clone(),
            HealthAnalyzer::default(),
            WindowSpec::last_events(10),
            Duration::ZERO,
            metrics.clone(),
        ));

        let reporter = HealthReporter::new(monitor, gateway, metrics.clone(), 60);
        let line = reporter.cycle().await.expect("cycle failed");

        let json = line.strip_prefix(HEALTH_JSON_PREFIX).unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["model_version"], "2.1.0");
        assert_eq!(value["health"]["status"], "insufficient_data");

        let rendered = metrics.render();
        assert!(rendered.contains("housing_model_loaded 1"));
        assert!(rendered.contains(r#"housing_health_status{status="insufficient_data"} 1"#));
    }
}
