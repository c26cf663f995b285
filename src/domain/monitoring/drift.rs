use crate::domain::monitoring::baseline::{FeatureBaseline, bucket_shares};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Floor applied to bucket shares so empty buckets don't blow up the log ratio
pub const PROPORTION_FLOOR: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftMethod {
    /// `|mean_window - mean_baseline| / std_baseline`
    MeanShift,
    /// Population stability index over the baseline's buckets
    Psi,
}

impl fmt::Display for DriftMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftMethod::MeanShift => write!(f, "mean_shift"),
            DriftMethod::Psi => write!(f, "psi"),
        }
    }
}

impl FromStr for DriftMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean_shift" | "zscore" => Ok(DriftMethod::MeanShift),
            "psi" => Ok(DriftMethod::Psi),
            _ => bail!("Invalid DRIFT_METHOD: {}. Must be 'mean_shift' or 'psi'", s),
        }
    }
}

/// Drift verdict for one input feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDrift {
    pub feature: String,
    /// Method actually used (PSI falls back to mean shift without buckets)
    pub method: DriftMethod,
    pub samples: usize,
    pub window_mean: Option<f64>,
    pub baseline_mean: f64,
    /// `None` when the window held too few values to score
    pub score: Option<f64>,
    pub threshold: f64,
    pub drifted: bool,
}

/// Drift of the model output against the baseline prediction mean
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionDrift {
    pub samples: usize,
    pub window_mean: f64,
    pub baseline_mean: f64,
    /// Relative change of the mean
    pub score: f64,
    pub threshold: f64,
    pub drifted: bool,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standardized mean shift of `window_mean` against the baseline. `None`
/// when the baseline has no usable spread.
pub fn mean_shift(window_mean: f64, baseline: &FeatureBaseline) -> Option<f64> {
    if !baseline.is_usable() {
        return None;
    }
    Some((window_mean - baseline.mean).abs() / baseline.std_dev)
}

/// Population stability index of `values` against the baseline buckets.
/// `None` if the baseline carries no usable buckets or `values` is empty.
pub fn population_stability(values: &[f64], baseline: &FeatureBaseline) -> Option<f64> {
    if !baseline.has_buckets() || values.is_empty() {
        return None;
    }

    let actual = bucket_shares(&baseline.bucket_edges, values);
    let psi = baseline
        .bucket_proportions
        .iter()
        .zip(actual)
        .map(|(expected, actual)| {
            let e = expected.max(PROPORTION_FLOOR);
            let a = actual.max(PROPORTION_FLOOR);
            (a - e) * (a / e).ln()
        })
        .sum();
    Some(psi)
}

/// Score one feature's window values against its baseline
pub fn measure_feature(
    feature: &str,
    values: &[f64],
    baseline: &FeatureBaseline,
    method: DriftMethod,
    mean_shift_threshold: f64,
    psi_threshold: f64,
    min_samples: usize,
) -> FeatureDrift {
    let window_mean = mean(values);
    let effective = match method {
        DriftMethod::Psi if baseline.has_buckets() => DriftMethod::Psi,
        _ => DriftMethod::MeanShift,
    };
    let threshold = match effective {
        DriftMethod::MeanShift => mean_shift_threshold,
        DriftMethod::Psi => psi_threshold,
    };

    let score = if values.len() < min_samples.max(1) {
        None
    } else {
        match effective {
            DriftMethod::MeanShift => window_mean.and_then(|m| mean_shift(m, baseline)),
            DriftMethod::Psi => population_stability(values, baseline),
        }
    };

    FeatureDrift {
        feature: feature.to_string(),
        method: effective,
        samples: values.len(),
        window_mean,
        baseline_mean: baseline.mean,
        score,
        threshold,
        drifted: score.is_some_and(|s| s > threshold),
    }
}

/// Relative shift of the mean prediction. `None` without outputs or with a
/// zero baseline mean.
pub fn measure_prediction(
    predictions: &[f64],
    baseline: &FeatureBaseline,
    threshold: f64,
) -> Option<PredictionDrift> {
    let window_mean = mean(predictions)?;
    if baseline.mean == 0.0 {
        return None;
    }
    let score = (window_mean - baseline.mean).abs() / baseline.mean.abs();
    Some(PredictionDrift {
        samples: predictions.len(),
        window_mean,
        baseline_mean: baseline.mean,
        score,
        threshold,
        drifted: score > threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline(mean: f64, std_dev: f64) -> FeatureBaseline {
        FeatureBaseline {
            count: 1000,
            mean,
            std_dev,
            bucket_edges: vec![],
            bucket_proportions: vec![],
        }
    }

    #[test]
    fn test_mean_shift_in_standard_deviations() {
        let b = baseline(3.0, 2.0);
        assert!((mean_shift(13.0, &b).unwrap() - 5.0).abs() < 1e-12);
        assert!((mean_shift(-1.0, &b).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_baseline_is_not_scored() {
        for std_dev in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let b = baseline(3.0, std_dev);
            assert!(mean_shift(5.0, &b).is_none());

            let drift =
                measure_feature("MedInc", &[8.0; 30], &b, DriftMethod::MeanShift, 2.0, 0.2, 20);
            assert!(drift.score.is_none());
            assert!(!drift.drifted);
        }
    }

    #[test]
    fn test_five_sigma_shift_is_drifted() {
        let b = baseline(3.0, 1.0);
        let values = vec![8.0; 30];
        let drift = measure_feature("MedInc", &values, &b, DriftMethod::MeanShift, 2.0, 0.2, 20);
        assert_eq!(drift.score, Some(5.0));
        assert!(drift.drifted);
    }

    #[test]
    fn test_too_few_samples_not_scored() {
        let b = baseline(3.0, 1.0);
        let values = vec![8.0; 5];
        let drift = measure_feature("MedInc", &values, &b, DriftMethod::MeanShift, 2.0, 0.2, 20);
        assert_eq!(drift.score, None);
        assert!(!drift.drifted);
    }

    #[test]
    fn test_psi_zero_for_identical_distribution() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let b = FeatureBaseline::from_values(&values, 10).unwrap();
        let psi = population_stability(&values, &b).unwrap();
        assert!(psi.abs() < 1e-9);
    }

    #[test]
    fn test_psi_large_for_shifted_distribution() {
        let reference: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let shifted: Vec<f64> = (0..100).map(|i| 500.0 + i as f64).collect();
        let b = FeatureBaseline::from_values(&reference, 10).unwrap();

        let drift = measure_feature("Population", &shifted, &b, DriftMethod::Psi, 2.0, 0.2, 20);
        assert_eq!(drift.method, DriftMethod::Psi);
        assert!(drift.score.unwrap() > 1.0);
        assert!(drift.drifted);
    }

    #[test]
    fn test_psi_without_buckets_falls_back_to_mean_shift() {
        let b = baseline(0.0, 1.0);
        let drift = measure_feature("HouseAge", &[0.5; 25], &b, DriftMethod::Psi, 2.0, 0.2, 20);
        assert_eq!(drift.method, DriftMethod::MeanShift);
        assert_eq!(drift.threshold, 2.0);
        assert!(!drift.drifted);
    }

    #[test]
    fn test_prediction_drift_relative_change() {
        let b = baseline(2.0, 0.5);
        let drift = measure_prediction(&[2.5, 2.5], &b, 0.1).unwrap();
        assert!((drift.score - 0.25).abs() < 1e-12);
        assert!(drift.drifted);
        assert!(measure_prediction(&[], &b, 0.1).is_none());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("PSI".parse::<DriftMethod>().unwrap(), DriftMethod::Psi);
        assert_eq!(
            "mean_shift".parse::<DriftMethod>().unwrap(),
            DriftMethod::MeanShift
        );
        assert!("wasserstein".parse::<DriftMethod>().is_err());
    }
}
