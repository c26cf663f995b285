//! Serving path configuration: model location, request timeouts and the
//! validator's unknown-field policy.

use crate::application::serving::orchestrator::ServingConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServingEnvConfig {
    pub model_dir: PathBuf,
    pub prediction_timeout_ms: u64,
    pub record_timeout_ms: u64,
    pub allow_unknown_fields: bool,
}

impl Default for ServingEnvConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            prediction_timeout_ms: 500,
            record_timeout_ms: 200,
            allow_unknown_fields: false,
        }
    }
}

impl ServingEnvConfig {
    pub fn from_env() -> Self {
        Self {
            model_dir: PathBuf::from(env::var("MODEL_DIR").unwrap_or_else(|_| "models".to_string())),
            prediction_timeout_ms: env::var("PREDICTION_TIMEOUT_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse::<u64>()
                .unwrap_or(500),
            record_timeout_ms: env::var("RECORD_TIMEOUT_MS")
                .unwrap_or_else(|_| "200".to_string())
                .parse::<u64>()
                .unwrap_or(200),
            allow_unknown_fields: env::var("ALLOW_UNKNOWN_FIELDS")
                .unwrap_or_else(|_| "false".to_string())
                .parse::<bool>()
                .unwrap_or(false),
        }
    }

    pub fn record_timeout(&self) -> Duration {
        Duration::from_millis(self.record_timeout_ms)
    }

    pub fn serving(&self) -> ServingConfig {
        ServingConfig {
            prediction_timeout: Duration::from_millis(self.prediction_timeout_ms),
        }
    }
}
