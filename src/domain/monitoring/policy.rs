use crate::domain::monitoring::drift::DriftMethod;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Drift and health thresholds. Every field may be overridden from
/// environment variables or a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitoringPolicy {
    pub drift_method: DriftMethod,
    /// Standardized mean shift (in baseline standard deviations)
    pub mean_shift_threshold: f64,
    pub psi_threshold: f64,
    /// Fewer window values than this and the feature is not scored
    pub min_drift_samples: usize,

    pub critical_error_rate: f64,
    pub degraded_error_rate: f64,
    /// Drifted-feature count at or above which the window is critical. 0 disables.
    pub critical_drifted_features: usize,
    /// Drifted-feature count at or above which the window is degraded. 0 disables.
    pub degraded_drifted_features: usize,
    pub latency_p95_ceiling_ms: f64,

    /// Relative change of mean prediction vs the baseline output mean
    pub prediction_drift_threshold: f64,
    /// Below this many requests the snapshot carries a low-volume note
    pub low_volume_threshold: usize,
}

impl Default for MonitoringPolicy {
    fn default() -> Self {
        Self {
            drift_method: DriftMethod::MeanShift,
            mean_shift_threshold: 2.0,
            psi_threshold: 0.2,
            min_drift_samples: 20,
            critical_error_rate: 0.10,
            degraded_error_rate: 0.01,
            critical_drifted_features: 3,
            degraded_drifted_features: 1,
            latency_p95_ceiling_ms: 250.0,
            prediction_drift_threshold: 0.10,
            low_volume_threshold: 10,
        }
    }
}

impl MonitoringPolicy {
    /// Threshold that applies to the configured drift method
    pub fn drift_threshold(&self) -> f64 {
        match self.drift_method {
            DriftMethod::MeanShift => self.mean_shift_threshold,
            DriftMethod::Psi => self.psi_threshold,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse monitoring policy")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read monitoring policy {}", path.display()))?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let policy = MonitoringPolicy::from_toml_str(
            r#"
            drift_method = "psi"
            critical_drifted_features = 1
            "#,
        )
        .unwrap();

        assert_eq!(policy.drift_method, DriftMethod::Psi);
        assert_eq!(policy.critical_drifted_features, 1);
        assert_eq!(policy.critical_error_rate, 0.10);
        assert_eq!(policy.drift_threshold(), 0.2);
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(MonitoringPolicy::from_toml_str("drift_method = \"ks\"").is_err());
    }
}
