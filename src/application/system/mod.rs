use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::application::bootstrap::{
    persistence::{PersistenceBootstrap, PersistenceHandle},
    services::{ServicesBootstrap, ServicesHandle},
};
use crate::application::ml::predictor_gateway::PredictorGateway;
use crate::application::monitoring::event_recorder::EventRecorder;
use crate::application::monitoring::health_monitor::HealthMonitor;
use crate::application::serving::orchestrator::PredictionService;
use crate::config::Config;
use crate::domain::repositories::PredictionEventRepository;
use crate::infrastructure::observability::{HealthReporter, Metrics};

pub struct Application {
    pub config: Config,
    pub persistence: PersistenceHandle,
    pub services: ServicesHandle,
    pub metrics: Metrics,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        info!(
            "Building prediction service (storage: {:?}, model dir: {})",
            config.server.mode,
            config.serving.model_dir.display()
        );

        let metrics = Metrics::new()?;
        let persistence = PersistenceBootstrap::init(&config.server).await?;
        let services =
            ServicesBootstrap::init(&config, persistence.event_repository.clone(), metrics.clone())?;

        Ok(Self {
            config,
            persistence,
            services,
            metrics,
        })
    }

    pub fn service(&self) -> Arc<PredictionService> {
        self.services.service.clone()
    }

    pub fn monitor(&self) -> Arc<HealthMonitor> {
        self.services.monitor.clone()
    }

    pub fn gateway(&self) -> Arc<PredictorGateway> {
        self.services.gateway.clone()
    }

    pub fn recorder(&self) -> Arc<EventRecorder> {
        self.services.recorder.clone()
    }

    /// Raw event store, for retention work outside the append-only recorder
    pub fn event_repository(&self) -> Arc<dyn PredictionEventRepository> {
        self.persistence.event_repository.clone()
    }

    /// Periodic health reporter, when enabled
    pub fn reporter(&self) -> Option<HealthReporter> {
        self.config.observability.enabled.then(|| {
            HealthReporter::new(
                self.monitor(),
                self.gateway(),
                self.metrics.clone(),
                self.config.observability.interval_seconds,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        MonitoringEnvConfig, ObservabilityEnvConfig, ServerEnvConfig, ServingEnvConfig,
        StorageMode,
    };
    use crate::domain::monitoring::event::EventFilter;
    use crate::domain::monitoring::policy::MonitoringPolicy;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn memory_config() -> Config {
        Config {
            server: ServerEnvConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 0,
                database_url: String::new(),
                mode: StorageMode::Memory,
            },
            serving: ServingEnvConfig {
                model_dir: std::env::temp_dir()
                    .join(format!("housing-no-model-{}", uuid::Uuid::new_v4())),
                ..Default::default()
            },
            monitoring: MonitoringEnvConfig {
                window_events: 10,
                window_minutes: None,
                snapshot_ttl_secs: 0,
                policy_file: None,
                policy: MonitoringPolicy::default(),
            },
            observability: ObservabilityEnvConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_retention_goes_through_the_repository() {
        let app = Application::build(memory_config()).await.unwrap();
        let payload = json!({
            "MedInc": 3.5, "HouseAge": 20.0, "AveRooms": 5.0, "AveBedrms": 1.0,
            "Population": 1200.0, "AveOccup": 3.0, "Latitude": 34.0, "Longitude": -118.2
        });

        // No model: the failure is still logged
        app.service().serve(&payload).await;
        assert_eq!(app.recorder().collect(EventFilter::all()).await.unwrap().len(), 1);

        let deleted = app
            .event_repository()
            .purge_before(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(app.recorder().collect(EventFilter::all()).await.unwrap().is_empty());
    }
}
