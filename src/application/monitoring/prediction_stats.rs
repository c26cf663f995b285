use crate::application::monitoring::event_recorder::EventRecorder;
use crate::domain::errors::PersistenceError;
use crate::domain::monitoring::event::{EventFilter, PredictionEvent};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Min, OrderStatistics};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSummary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent with fewer than two outputs
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Volume and output summary over the last `days`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionStats {
    pub days: i64,
    pub total_predictions: usize,
    pub failed_predictions: usize,
    pub date_range: Option<DateRange>,
    pub prediction_stats: Option<OutputSummary>,
    /// Event count per UTC calendar day
    pub predictions_per_day: BTreeMap<NaiveDate, usize>,
}

pub fn summarize(events: &[PredictionEvent], days: i64) -> PredictionStats {
    let date_range = match (
        events.iter().map(|e| e.timestamp).min(),
        events.iter().map(|e| e.timestamp).max(),
    ) {
        (Some(start), Some(end)) => Some(DateRange { start, end }),
        _ => None,
    };

    let outputs: Vec<f64> = events.iter().filter_map(|e| e.prediction).collect();
    let prediction_stats = (!outputs.is_empty()).then(|| {
        let count = outputs.len();
        let mut data = Data::new(outputs);
        OutputSummary {
            mean: data.mean().unwrap_or(f64::NAN),
            median: data.median(),
            std: if count > 1 { data.std_dev() } else { None },
            min: data.min(),
            max: data.max(),
        }
    });

    let mut predictions_per_day = BTreeMap::new();
    for event in events {
        *predictions_per_day
            .entry(event.timestamp.date_naive())
            .or_insert(0) += 1;
    }

    PredictionStats {
        days,
        total_predictions: events.len(),
        failed_predictions: events.iter().filter(|e| !e.success).count(),
        date_range,
        prediction_stats,
        predictions_per_day,
    }
}

/// `now - days`, or `None` when `days` is negative or does not fit a timestamp
pub fn lookback_start(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    if days < 0 {
        return None;
    }
    Duration::try_days(days).and_then(|span| now.checked_sub_signed(span))
}

/// Statistics over events from `now - days` to `now`. A look-back reaching
/// past the representable range covers the whole log.
pub async fn prediction_stats(
    recorder: &EventRecorder,
    days: i64,
    now: DateTime<Utc>,
) -> Result<PredictionStats, PersistenceError> {
    let filter = match lookback_start(now, days) {
        Some(since) => EventFilter::all().since(since).until(now),
        None => EventFilter::all().until(now),
    };
    let events = recorder.collect(filter).await?;
    Ok(summarize(&events, days))
}
