use crate::application::ml::predictor_gateway::PredictorGateway;
use crate::application::monitoring::event_recorder::EventRecorder;
use crate::application::monitoring::health_analyzer::HealthAnalyzer;
use crate::domain::errors::PersistenceError;
use crate::domain::monitoring::event::now_micros;
use crate::domain::monitoring::health::HealthSnapshot;
use crate::domain::monitoring::window::{RollingWindow, WindowSpec};
use crate::infrastructure::observability::metrics::Metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Builds health snapshots from the event log, memoizing the latest one
/// for `ttl` (zero disables memoization).
pub struct HealthMonitor {
    recorder: Arc<EventRecorder>,
    gateway: Arc<PredictorGateway>,
    analyzer: HealthAnalyzer,
    window: WindowSpec,
    ttl: Duration,
    metrics: Metrics,
    cached: RwLock<Option<(Instant, Arc<HealthSnapshot>)>>,
}

impl HealthMonitor {
    pub fn new(
        recorder: Arc<EventRecorder>,
        gateway: Arc<PredictorGateway>,
        analyzer: HealthAnalyzer,
        window: WindowSpec,
        ttl: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            recorder,
            gateway,
            analyzer,
            window,
            ttl,
            metrics,
            cached: RwLock::new(None),
        }
    }

    pub fn window_spec(&self) -> WindowSpec {
        self.window
    }

    /// Cached snapshot if still fresh, otherwise a new one
    pub async fn current(&self) -> Result<Arc<HealthSnapshot>, PersistenceError> {
        if !self.ttl.is_zero()
            && let Some((at, snapshot)) = self.cached.read().await.as_ref()
            && at.elapsed() < self.ttl
        {
            return Ok(snapshot.clone());
        }
        self.refresh().await
    }

    /// Recompute now, publish gauges and replace the cache
    pub async fn refresh(&self) -> Result<Arc<HealthSnapshot>, PersistenceError> {
        let snapshot = Arc::new(self.snapshot_at(now_micros()).await?);
        self.metrics.publish_health(&snapshot);
        *self.cached.write().await = Some((Instant::now(), snapshot.clone()));
        Ok(snapshot)
    }

    /// Uncached snapshot of the window ending at `now`
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> Result<HealthSnapshot, PersistenceError> {
        let events = self.recorder.collect(self.window.filter(now)).await?;
        let window = RollingWindow::new(self.window, now, events);
        let model = self.gateway.current();
        let baseline = model.as_ref().and_then(|m| m.baseline.as_deref());

        let snapshot = self.analyzer.analyze(&window, baseline);
        debug!(
            "HealthMonitor: {} over {} events ({} drifted features)",
            snapshot.status, snapshot.request_count, snapshot.drifted_features
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::housing::features::HousingFeatures;
    use crate::domain::monitoring::event::PredictionEvent;
    use crate::domain::monitoring::health::HealthStatus;
    use crate::infrastructure::mock::{FixedRegressor, model_with};
    use crate::infrastructure::repositories::InMemoryPredictionEventRepository;

    fn monitor(ttl: Duration) -> (HealthMonitor, Arc<EventRecorder>, Arc<PredictorGateway>) {
        let recorder = Arc::new(EventRecorder::new(
            Arc::new(InMemoryPredictionEventRepository::new()),
            Duration::from_secs(1),
        ));
        let gateway = Arc::new(PredictorGateway::new());
        let monitor = HealthMonitor::new(
            recorder.clone(),
            gateway.clone(),
            HealthAnalyzer::default(),
            WindowSpec::last_events(100),
            ttl,
            Metrics::new().unwrap(),
        );
        (monitor, recorder, gateway)
    }

    async fn record_success(recorder: &EventRecorder, gateway: &PredictorGateway) {
        let outcome = gateway.predict(&HousingFeatures::default()).unwrap();
        let event = PredictionEvent::success(HousingFeatures::default(), &outcome);
        recorder.record(&event).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_log_is_insufficient_data() {
        let (monitor, _, _) = monitor(Duration::ZERO);
        let snapshot = monitor.current().await.unwrap();
        assert_eq!(snapshot.status, HealthStatus::InsufficientData);
    }

    #[tokio::test]
    async fn test_memoized_until_refresh() {
        let (monitor, recorder, gateway) = monitor(Duration::from_secs(60));
        gateway.install(model_with("v1", Box::new(FixedRegressor::new(2.0))));

        let first = monitor.current().await.unwrap();
        assert_eq!(first.request_count, 0);

        record_success(&recorder, &gateway).await;
        assert_eq!(monitor.current().await.unwrap().request_count, 0);
        assert_eq!(monitor.refresh().await.unwrap().request_count, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_recomputes() {
        let (monitor, recorder, gateway) = monitor(Duration::ZERO);
        gateway.install(model_with("v1", Box::new(FixedRegressor::new(2.0))));

        assert_eq!(monitor.current().await.unwrap().request_count, 0);
        record_success(&recorder, &gateway).await;
        assert_eq!(monitor.current().await.unwrap().request_count, 1);
    }
}
