use crate::domain::housing::features::INPUT_FEATURES;
use crate::domain::monitoring::baseline::BaselineDistribution;
use crate::domain::monitoring::drift::{self, FeatureDrift};
use crate::domain::monitoring::health::{
    self, HealthSnapshot, HealthStatus, LatencyPercentiles, WindowSignals, WindowSummary,
};
use crate::domain::monitoring::policy::MonitoringPolicy;
use crate::domain::monitoring::window::RollingWindow;
use statrs::statistics::{Data, OrderStatistics};

/// Turns a rolling window into a health snapshot. Pure: the same window,
/// baseline and policy always give the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct HealthAnalyzer {
    policy: MonitoringPolicy,
}

impl HealthAnalyzer {
    pub fn new(policy: MonitoringPolicy) -> Self {
        Self { policy }
    }

    pub fn analyze(
        &self,
        window: &RollingWindow,
        baseline: Option<&BaselineDistribution>,
    ) -> HealthSnapshot {
        let events = window.events();
        let request_count = events.len();
        let error_count = events.iter().filter(|e| !e.success).count();
        let error_rate = if request_count == 0 {
            0.0
        } else {
            error_count as f64 / request_count as f64
        };

        let latencies: Vec<f64> = events
            .iter()
            .map(|e| e.latency_ms)
            .filter(|v| v.is_finite())
            .collect();
        let latency = latency_percentiles(latencies);

        let feature_drift = baseline
            .map(|b| self.feature_drift(window, b))
            .unwrap_or_default();
        let drifted_features = feature_drift.iter().filter(|d| d.drifted).count();

        let prediction_drift = baseline
            .and_then(|b| b.prediction.as_ref())
            .and_then(|reference| {
                let outputs: Vec<f64> = events.iter().filter_map(|e| e.prediction).collect();
                drift::measure_prediction(
                    &outputs,
                    reference,
                    self.policy.prediction_drift_threshold,
                )
            });

        let signals = WindowSignals {
            request_count,
            error_rate,
            drifted_features,
            latency_p95_ms: latency.map(|l| l.p95_ms),
        };
        let (status, reasons) = health::classify(&signals, &self.policy);

        let mut notes = Vec::new();
        if request_count > 0 && request_count < self.policy.low_volume_threshold {
            notes.push(format!(
                "Low prediction volume: {} events in window",
                request_count
            ));
        }
        if baseline.is_none() && status != HealthStatus::InsufficientData {
            notes.push("No baseline available, drift not evaluated".to_string());
        }
        if let Some(pd) = prediction_drift.as_ref().filter(|pd| pd.drifted) {
            notes.push(format!(
                "Mean prediction moved {:.1}% from baseline",
                pd.score * 100.0
            ));
        }

        HealthSnapshot {
            timestamp: window.evaluated_at,
            window: WindowSummary {
                spec: window.spec,
                first_event: window.first_timestamp(),
                last_event: window.last_timestamp(),
            },
            request_count,
            error_count,
            error_rate,
            latency,
            feature_drift,
            drifted_features,
            prediction_drift,
            baseline_available: baseline.is_some(),
            status,
            reasons,
            notes,
        }
    }

    fn feature_drift(
        &self,
        window: &RollingWindow,
        baseline: &BaselineDistribution,
    ) -> Vec<FeatureDrift> {
        INPUT_FEATURES
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                let reference = baseline.feature(name)?;
                let values: Vec<f64> = window
                    .events()
                    .iter()
                    .map(|e| e.features.values()[idx])
                    .collect();
                Some(drift::measure_feature(
                    name,
                    &values,
                    reference,
                    self.policy.drift_method,
                    self.policy.mean_shift_threshold,
                    self.policy.psi_threshold,
                    self.policy.min_drift_samples,
                ))
            })
            .collect()
    }
}

fn latency_percentiles(latencies: Vec<f64>) -> Option<LatencyPercentiles> {
    if latencies.is_empty() {
        return None;
    }
    let mut data = Data::new(latencies);
    Some(LatencyPercentiles {
        p50_ms: data.quantile(0.50),
        p95_ms: data.quantile(0.95),
        p99_ms: data.quantile(0.99),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PredictionError;
    use crate::domain::housing::features::HousingFeatures;
    use crate::domain::ml::model::{ConfidenceInterval, PredictionOutcome};
    use crate::domain::monitoring::event::PredictionEvent;
    use crate::domain::monitoring::window::WindowSpec;
    use chrono::{Duration, Utc};

    fn success(med_inc: f64, latency_ms: u64) -> PredictionEvent {
        let outcome = PredictionOutcome {
            predicted_value: 2.0,
            model_id: "m".to_string(),
            model_version: "v1".to_string(),
            latency: std::time::Duration::from_millis(latency_ms),
            interval: ConfidenceInterval::around(2.0),
        };
        let features = HousingFeatures {
            med_inc,
            ..Default::default()
        };
        PredictionEvent::success(features, &outcome)
    }

    fn failure() -> PredictionEvent {
        PredictionEvent::failure(
            HousingFeatures::default(),
            &PredictionError::inference("boom"),
            None,
            std::time::Duration::from_millis(1),
        )
    }

    fn window(events: Vec<PredictionEvent>) -> RollingWindow {
        let now = Utc::now();
        let n = events.len();
        let events = events
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.at(now - Duration::milliseconds((n - i) as i64)))
            .collect();
        RollingWindow::new(WindowSpec::last_events(1000), now, events)
    }

    fn med_inc_baseline(mean: f64) -> BaselineDistribution {
        let rows: Vec<HousingFeatures> = (0..200)
            .map(|i| HousingFeatures {
                med_inc: mean + if i % 2 == 0 { 1.0 } else { -1.0 },
                ..Default::default()
            })
            .collect();
        BaselineDistribution::from_rows(&rows, &[], 10, "test")
    }

    #[test]
    fn test_empty_window_is_insufficient_data() {
        let snapshot = HealthAnalyzer::default().analyze(&window(vec![]), None);
        assert_eq!(snapshot.status, HealthStatus::InsufficientData);
        assert_eq!(snapshot.request_count, 0);
        assert!(snapshot.latency.is_none());
    }

    #[test]
    fn test_percentiles_and_error_rate() {
        let mut events: Vec<_> = (1..=99).map(|ms| success(3.0, ms)).collect();
        events.push(failure());
        let snapshot = HealthAnalyzer::default().analyze(&window(events), None);

        assert_eq!(snapshot.request_count, 100);
        assert_eq!(snapshot.error_count, 1);
        assert!((snapshot.error_rate - 0.01).abs() < 1e-12);
        let latency = snapshot.latency.unwrap();
        assert!(latency.p50_ms > 40.0 && latency.p50_ms < 60.0);
        assert!(latency.p95_ms <= latency.p99_ms);
        // Exactly 1% is not above the degraded threshold
        assert_eq!(snapshot.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_drift_against_baseline() {
        // Baseline std is ~1.0; window mean sits 5 standard deviations away
        let baseline = med_inc_baseline(3.0);
        let events: Vec<_> = (0..50).map(|_| success(8.0, 5)).collect();
        let analyzer = HealthAnalyzer::new(MonitoringPolicy {
            critical_drifted_features: 1,
            ..Default::default()
        });

        let snapshot = analyzer.analyze(&window(events), Some(&baseline));
        let med_inc = snapshot
            .feature_drift
            .iter()
            .find(|d| d.feature == "MedInc")
            .unwrap();
        assert!(med_inc.drifted);
        assert!(med_inc.score.unwrap() > 4.9);
        assert_eq!(snapshot.drifted_features, 1);
        assert_eq!(snapshot.status, HealthStatus::Critical);
    }

    #[test]
    fn test_low_volume_is_a_note_only() {
        let events: Vec<_> = (0..3).map(|_| success(3.0, 5)).collect();
        let snapshot = HealthAnalyzer::default().analyze(&window(events), None);
        assert_eq!(snapshot.status, HealthStatus::Healthy);
        assert!(snapshot.notes.iter().any(|n| n.contains("Low prediction volume")));
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let events: Vec<_> = (0..30).map(|i| success(3.0 + i as f64 * 0.1, i)).collect();
        let w = window(events);
        let baseline = med_inc_baseline(3.0);
        let analyzer = HealthAnalyzer::default();
        assert_eq!(
            analyzer.analyze(&w, Some(&baseline)),
            analyzer.analyze(&w, Some(&baseline))
        );
    }
}
