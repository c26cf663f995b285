use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::ml::predictor_gateway::PredictorGateway;
use crate::application::monitoring::event_recorder::EventRecorder;
use crate::application::monitoring::health_analyzer::HealthAnalyzer;
use crate::application::monitoring::health_monitor::HealthMonitor;
use crate::application::serving::orchestrator::PredictionService;
use crate::config::Config;
use crate::domain::housing::validation::Validator;
use crate::domain::repositories::PredictionEventRepository;
use crate::infrastructure::ml::FileModelProvider;
use crate::infrastructure::observability::Metrics;

pub struct ServicesHandle {
    pub gateway: Arc<PredictorGateway>,
    pub recorder: Arc<EventRecorder>,
    pub service: Arc<PredictionService>,
    pub monitor: Arc<HealthMonitor>,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    /// Wire the serving and monitoring services. A model that fails to load
    /// leaves the service running but not ready.
    pub fn init(
        config: &Config,
        event_repository: Arc<dyn PredictionEventRepository>,
        metrics: Metrics,
    ) -> Result<ServicesHandle> {
        let provider = Arc::new(FileModelProvider::new(config.serving.model_dir.clone()));
        let gateway = Arc::new(PredictorGateway::with_provider(provider));
        match gateway.reload() {
            Ok(model) => info!(
                "Model {} v{} loaded",
                model.descriptor.model_id, model.descriptor.version
            ),
            Err(e) => warn!("Starting without a model: {:#}", e),
        }
        metrics.set_model(gateway.descriptor().as_ref());

        let recorder = Arc::new(EventRecorder::new(
            event_repository,
            config.serving.record_timeout(),
        ));

        let validator =
            Validator::california().allow_unknown_fields(config.serving.allow_unknown_fields);
        let service = Arc::new(PredictionService::new(
            validator,
            gateway.clone(),
            recorder.clone(),
            metrics.clone(),
            config.serving.serving(),
        ));

        let monitor = Arc::new(HealthMonitor::new(
            recorder.clone(),
            gateway.clone(),
            HealthAnalyzer::new(config.monitoring.policy.clone()),
            config.monitoring.window_spec(),
            config.monitoring.snapshot_ttl(),
            metrics,
        ));

        Ok(ServicesHandle {
            gateway,
            recorder,
            service,
            monitor,
        })
    }
}
