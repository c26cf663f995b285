//! Health monitoring configuration parsing from environment variables.
//!
//! The drift/health policy starts from defaults, is optionally replaced by a
//! TOML file (`MONITORING_POLICY_FILE`) and finally overridden field by field
//! from the environment.

use crate::domain::monitoring::drift::DriftMethod;
use crate::domain::monitoring::policy::MonitoringPolicy;
use crate::domain::monitoring::window::WindowSpec;
use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for `HEALTH_WINDOW_MINUTES` (one hundred years)
pub const MAX_WINDOW_MINUTES: i64 = 100 * 366 * 24 * 60;

#[derive(Debug, Clone)]
pub struct MonitoringEnvConfig {
    pub window_events: usize,
    /// Time-based window; takes precedence over `window_events` when set
    pub window_minutes: Option<i64>,
    pub snapshot_ttl_secs: u64,
    pub policy_file: Option<PathBuf>,
    pub policy: MonitoringPolicy,
}

impl MonitoringEnvConfig {
    pub fn from_env() -> Result<Self> {
        let policy_file = env::var("MONITORING_POLICY_FILE").ok().map(PathBuf::from);
        let base = match &policy_file {
            Some(path) => MonitoringPolicy::from_file(path)?,
            None => MonitoringPolicy::default(),
        };

        let window_minutes = match env::var("HEALTH_WINDOW_MINUTES") {
            Ok(raw) => {
                let minutes = raw
                    .parse::<i64>()
                    .context("Failed to parse HEALTH_WINDOW_MINUTES")?;
                if minutes <= 0 || minutes > MAX_WINDOW_MINUTES {
                    bail!(
                        "HEALTH_WINDOW_MINUTES must be between 1 and {}, got {}",
                        MAX_WINDOW_MINUTES,
                        minutes
                    );
                }
                Some(minutes)
            }
            Err(_) => None,
        };

        let window_events = Self::parse_usize("HEALTH_WINDOW_EVENTS", 1000)?;
        if window_events == 0 {
            bail!("HEALTH_WINDOW_EVENTS must be at least 1");
        }

        Ok(Self {
            window_events,
            window_minutes,
            snapshot_ttl_secs: Self::parse_u64("HEALTH_SNAPSHOT_TTL_SECS", 5)?,
            policy_file,
            policy: Self::policy_with_overrides(base)?,
        })
    }

    pub fn window_spec(&self) -> WindowSpec {
        match self.window_minutes {
            Some(minutes) => WindowSpec::last_minutes(minutes),
            None => WindowSpec::last_events(self.window_events),
        }
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }

    fn policy_with_overrides(base: MonitoringPolicy) -> Result<MonitoringPolicy> {
        let drift_method = match env::var("DRIFT_METHOD") {
            Ok(raw) => DriftMethod::from_str(&raw)?,
            Err(_) => base.drift_method,
        };

        Ok(MonitoringPolicy {
            drift_method,
            mean_shift_threshold: Self::parse_f64(
                "DRIFT_MEAN_SHIFT_THRESHOLD",
                base.mean_shift_threshold,
            )?,
            psi_threshold: Self::parse_f64("DRIFT_PSI_THRESHOLD", base.psi_threshold)?,
            min_drift_samples: Self::parse_usize("MIN_DRIFT_SAMPLES", base.min_drift_samples)?,
            critical_error_rate: Self::parse_f64("CRITICAL_ERROR_RATE", base.critical_error_rate)?,
            degraded_error_rate: Self::parse_f64("DEGRADED_ERROR_RATE", base.degraded_error_rate)?,
            critical_drifted_features: Self::parse_usize(
                "CRITICAL_DRIFTED_FEATURES",
                base.critical_drifted_features,
            )?,
            degraded_drifted_features: Self::parse_usize(
                "DEGRADED_DRIFTED_FEATURES",
                base.degraded_drifted_features,
            )?,
            latency_p95_ceiling_ms: Self::parse_f64(
                "LATENCY_P95_CEILING_MS",
                base.latency_p95_ceiling_ms,
            )?,
            prediction_drift_threshold: Self::parse_f64(
                "PREDICTION_DRIFT_THRESHOLD",
                base.prediction_drift_threshold,
            )?,
            low_volume_threshold: Self::parse_usize(
                "LOW_VOLUME_THRESHOLD",
                base.low_volume_threshold,
            )?,
        })
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u64(key: &str, default: u64) -> Result<u64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
