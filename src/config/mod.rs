//! Service configuration.
//!
//! Settings come from environment variables (optionally seeded from a `.env`
//! file by the binaries) and are grouped into one sub-config per concern.

mod monitoring_config;
mod observability_config;
mod server_config;
mod serving_config;

pub use monitoring_config::{MAX_WINDOW_MINUTES, MonitoringEnvConfig};
pub use observability_config::ObservabilityEnvConfig;
pub use server_config::{ServerEnvConfig, StorageMode};
pub use serving_config::ServingEnvConfig;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerEnvConfig,
    pub serving: ServingEnvConfig,
    pub monitoring: MonitoringEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let server = ServerEnvConfig::from_env().context("Failed to load server config")?;
        let serving = ServingEnvConfig::from_env();
        let monitoring =
            MonitoringEnvConfig::from_env().context("Failed to load monitoring config")?;
        let observability = ObservabilityEnvConfig::from_env();

        Ok(Self {
            server,
            serving,
            monitoring,
            observability,
        })
    }
}
