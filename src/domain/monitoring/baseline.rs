//! Reference distributions for drift detection.
//!
//! A baseline is captured once (from training data or from an earlier
//! reference window of served events) and compared against every later window.

use crate::domain::housing::features::{HousingFeatures, INPUT_FEATURES};
use crate::domain::monitoring::event::PredictionEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, OrderStatistics};
use std::collections::BTreeMap;

pub const DEFAULT_BUCKETS: usize = 10;

/// Reference statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBaseline {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Interior bucket edges, ascending. `n` edges define `n + 1` buckets.
    #[serde(default)]
    pub bucket_edges: Vec<f64>,
    /// Share of reference values per bucket; sums to 1.
    #[serde(default)]
    pub bucket_proportions: Vec<f64>,
}

impl FeatureBaseline {
    /// Summarize a reference sample. Returns `None` when fewer than two
    /// values are given or the sample has no spread.
    pub fn from_values(values: &[f64], buckets: usize) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.len() < 2 {
            return None;
        }

        let reference = finite.clone();
        let mut data = Data::new(finite);
        let mean = data.mean()?;
        let std_dev = data.std_dev()?;
        if std_dev.is_nan() || std_dev <= 0.0 {
            return None;
        }

        let mut bucket_edges = Vec::new();
        if buckets >= 2 {
            for i in 1..buckets {
                let edge = data.quantile(i as f64 / buckets as f64);
                if bucket_edges.last().is_none_or(|last: &f64| edge > *last) {
                    bucket_edges.push(edge);
                }
            }
        }

        let bucket_proportions = if bucket_edges.is_empty() {
            Vec::new()
        } else {
            bucket_shares(&bucket_edges, &reference)
        };

        Some(Self {
            count: reference.len(),
            mean,
            std_dev,
            bucket_edges,
            bucket_proportions,
        })
    }

    /// Finite mean and a finite, positive spread
    pub fn is_usable(&self) -> bool {
        self.mean.is_finite() && self.std_dev.is_finite() && self.std_dev > 0.0
    }

    pub fn has_buckets(&self) -> bool {
        !self.bucket_edges.is_empty()
            && self.bucket_proportions.len() == self.bucket_edges.len() + 1
    }
}

/// Index of the bucket `value` falls in, given ascending interior edges.
pub fn bucket_index(edges: &[f64], value: f64) -> usize {
    edges.partition_point(|edge| *edge <= value)
}

/// Share of `values` per bucket
pub fn bucket_shares(edges: &[f64], values: &[f64]) -> Vec<f64> {
    let mut counts = vec![0usize; edges.len() + 1];
    for v in values {
        counts[bucket_index(edges, *v)] += 1;
    }
    let total = values.len().max(1) as f64;
    counts.into_iter().map(|c| c as f64 / total).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineDistribution {
    pub captured_at: DateTime<Utc>,
    /// Where the reference came from (training file, event range...)
    pub source: String,
    pub features: BTreeMap<String, FeatureBaseline>,
    /// Reference for the model output, when known
    #[serde(default)]
    pub prediction: Option<FeatureBaseline>,
}

impl BaselineDistribution {
    pub fn from_rows(
        rows: &[HousingFeatures],
        predictions: &[f64],
        buckets: usize,
        source: impl Into<String>,
    ) -> Self {
        let features = INPUT_FEATURES
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                let column: Vec<f64> = rows.iter().map(|r| r.values()[idx]).collect();
                FeatureBaseline::from_values(&column, buckets).map(|b| (name.to_string(), b))
            })
            .collect();

        Self {
            captured_at: Utc::now(),
            source: source.into(),
            features,
            prediction: FeatureBaseline::from_values(predictions, buckets),
        }
    }

    /// Baseline from a reference window of served events. Failed events
    /// contribute their inputs but no output.
    pub fn from_events(events: &[PredictionEvent], buckets: usize) -> Self {
        let rows: Vec<HousingFeatures> = events.iter().map(|e| e.features).collect();
        let predictions: Vec<f64> = events.iter().filter_map(|e| e.prediction).collect();
        let source = match (events.first(), events.last()) {
            (Some(first), Some(last)) => format!(
                "events {} .. {}",
                first.timestamp.to_rfc3339(),
                last.timestamp.to_rfc3339()
            ),
            _ => "events (empty)".to_string(),
        };
        Self::from_rows(&rows, &predictions, buckets, source)
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureBaseline> {
        self.features.get(name)
    }

    /// Drop entries a hand-edited or older file may carry with no usable
    /// spread. Returns the names that were removed.
    pub fn retain_usable(&mut self) -> Vec<String> {
        let mut dropped: Vec<String> = self
            .features
            .iter()
            .filter(|(_, b)| !b.is_usable())
            .map(|(name, _)| name.clone())
            .collect();
        self.features.retain(|_, b| b.is_usable());
        if self.prediction.as_ref().is_some_and(|b| !b.is_usable()) {
            self.prediction = None;
            dropped.push("prediction".to_string());
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_baseline_moments() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let baseline = FeatureBaseline::from_values(&values, 4).unwrap();
        assert_eq!(baseline.count, 5);
        assert!((baseline.mean - 3.0).abs() < 1e-9);
        // Sample standard deviation
        assert!((baseline.std_dev - 2.5_f64.sqrt()).abs() < 1e-9);
        assert!(baseline.has_buckets());
        let total: f64 = baseline.bucket_proportions.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_retain_usable_drops_flat_entries() {
        let good = FeatureBaseline::from_values(&[1.0, 2.0, 3.0], 2).unwrap();
        let flat = FeatureBaseline {
            std_dev: 0.0,
            ..good.clone()
        };
        let mut baseline = BaselineDistribution {
            captured_at: Utc::now(),
            source: "hand edited".to_string(),
            features: BTreeMap::from([
                ("MedInc".to_string(), good.clone()),
                ("HouseAge".to_string(), flat.clone()),
            ]),
            prediction: Some(flat),
        };

        let dropped = baseline.retain_usable();
        assert_eq!(dropped, vec!["HouseAge".to_string(), "prediction".to_string()]);
        assert_eq!(baseline.features.len(), 1);
        assert!(baseline.feature("MedInc").is_some());
        assert!(baseline.prediction.is_none());
    }

    #[test]
    fn test_constant_column_has_no_baseline() {
        assert!(FeatureBaseline::from_values(&[2.0; 10], 4).is_none());
        assert!(FeatureBaseline::from_values(&[2.0], 4).is_none());
    }

    #[test]
    fn test_bucket_index_edges_are_left_closed() {
        let edges = [1.0, 2.0, 3.0];
        assert_eq!(bucket_index(&edges, 0.5), 0);
        assert_eq!(bucket_index(&edges, 1.0), 1);
        assert_eq!(bucket_index(&edges, 2.5), 2);
        assert_eq!(bucket_index(&edges, 9.0), 3);
    }

    #[test]
    fn test_from_rows_covers_every_varying_feature() {
        let rows: Vec<HousingFeatures> = (0..20)
            .map(|i| {
                let x = i as f64;
                HousingFeatures {
                    med_inc: 2.0 + x * 0.1,
                    house_age: 10.0 + x,
                    ave_rooms: 4.0 + x * 0.05,
                    ave_bedrms: 1.0 + x * 0.01,
                    population: 500.0 + x * 10.0,
                    ave_occup: 2.0 + x * 0.02,
                    latitude: 34.0 + x * 0.1,
                    longitude: -120.0 - x * 0.1,
                }
            })
            .collect();
        let predictions: Vec<f64> = (0..20).map(|i| 1.5 + i as f64 * 0.1).collect();

        let baseline = BaselineDistribution::from_rows(&rows, &predictions, 5, "unit");
        assert_eq!(baseline.features.len(), INPUT_FEATURES.len());
        assert!(baseline.prediction.is_some());
        assert!(baseline.feature("MedInc").unwrap().has_buckets());
    }
}
