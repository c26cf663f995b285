use crate::domain::monitoring::drift::{FeatureDrift, PredictionDrift};
use crate::domain::monitoring::policy::MonitoringPolicy;
use crate::domain::monitoring::window::WindowSpec;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
    InsufficientData,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Healthy,
        HealthStatus::Degraded,
        HealthStatus::Critical,
        HealthStatus::InsufficientData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Critical => "critical",
            HealthStatus::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyPercentiles {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub spec: WindowSpec,
    pub first_event: Option<DateTime<Utc>>,
    pub last_event: Option<DateTime<Utc>>,
}

/// Health of the serving path over one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub window: WindowSummary,
    pub request_count: usize,
    pub error_count: usize,
    pub error_rate: f64,
    pub latency: Option<LatencyPercentiles>,
    pub feature_drift: Vec<FeatureDrift>,
    pub drifted_features: usize,
    pub prediction_drift: Option<PredictionDrift>,
    pub baseline_available: bool,
    pub status: HealthStatus,
    /// Conditions that selected `status`
    pub reasons: Vec<String>,
    /// Informational notes that did not affect `status`
    pub notes: Vec<String>,
}

/// Aggregates the classification rules look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSignals {
    pub request_count: usize,
    pub error_rate: f64,
    pub drifted_features: usize,
    pub latency_p95_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    CriticalErrorRate,
    CriticalDrift,
    DegradedErrorRate,
    DegradedDrift,
    LatencyCeiling,
}

impl Condition {
    fn check(&self, s: &WindowSignals, p: &MonitoringPolicy) -> Option<String> {
        match self {
            Condition::CriticalErrorRate | Condition::DegradedErrorRate => {
                let limit = if *self == Condition::CriticalErrorRate {
                    p.critical_error_rate
                } else {
                    p.degraded_error_rate
                };
                (s.error_rate > limit).then(|| {
                    format!(
                        "error rate {:.2}% above {:.2}%",
                        s.error_rate * 100.0,
                        limit * 100.0
                    )
                })
            }
            Condition::CriticalDrift | Condition::DegradedDrift => {
                let limit = if *self == Condition::CriticalDrift {
                    p.critical_drifted_features
                } else {
                    p.degraded_drifted_features
                };
                (limit > 0 && s.drifted_features >= limit).then(|| {
                    format!(
                        "{} drifted feature(s), limit {}",
                        s.drifted_features, limit
                    )
                })
            }
            Condition::LatencyCeiling => s
                .latency_p95_ms
                .filter(|p95| *p95 > p.latency_p95_ceiling_ms)
                .map(|p95| {
                    format!(
                        "latency p95 {:.1}ms above {:.1}ms",
                        p95, p.latency_p95_ceiling_ms
                    )
                }),
        }
    }
}

struct HealthRule {
    status: HealthStatus,
    any_of: &'static [Condition],
}

/// Evaluated top to bottom; the first rule with a matching condition wins.
const RULES: [HealthRule; 2] = [
    HealthRule {
        status: HealthStatus::Critical,
        any_of: &[Condition::CriticalErrorRate, Condition::CriticalDrift],
    },
    HealthRule {
        status: HealthStatus::Degraded,
        any_of: &[
            Condition::DegradedErrorRate,
            Condition::DegradedDrift,
            Condition::LatencyCeiling,
        ],
    },
];

/// Total, deterministic classification of a window
pub fn classify(signals: &WindowSignals, policy: &MonitoringPolicy) -> (HealthStatus, Vec<String>) {
    if signals.request_count == 0 {
        return (
            HealthStatus::InsufficientData,
            vec!["no prediction events in window".to_string()],
        );
    }

    for rule in &RULES {
        let reasons: Vec<String> = rule
            .any_of
            .iter()
            .filter_map(|c| c.check(signals, policy))
            .collect();
        if !reasons.is_empty() {
            return (rule.status, reasons);
        }
    }

    (HealthStatus::Healthy, Vec::new())
}
