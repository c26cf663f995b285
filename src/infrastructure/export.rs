use crate::domain::monitoring::event::PredictionEvent;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => bail!("Invalid export format: {}. Must be 'csv' or 'json'", s),
        }
    }
}

/// Flat CSV layout of one event
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    event_id: String,
    timestamp: String,
    #[serde(rename = "MedInc")]
    med_inc: f64,
    #[serde(rename = "HouseAge")]
    house_age: f64,
    #[serde(rename = "AveRooms")]
    ave_rooms: f64,
    #[serde(rename = "AveBedrms")]
    ave_bedrms: f64,
    #[serde(rename = "Population")]
    population: f64,
    #[serde(rename = "AveOccup")]
    ave_occup: f64,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    prediction: Option<f64>,
    model_id: Option<&'a str>,
    model_version: &'a str,
    latency_ms: f64,
    success: bool,
    error_code: Option<&'a str>,
    error_detail: Option<&'a str>,
}

impl<'a> From<&'a PredictionEvent> for ExportRow<'a> {
    fn from(e: &'a PredictionEvent) -> Self {
        let f = &e.features;
        Self {
            event_id: e.event_id.to_string(),
            timestamp: e.timestamp.to_rfc3339(),
            med_inc: f.med_inc,
            house_age: f.house_age,
            ave_rooms: f.ave_rooms,
            ave_bedrms: f.ave_bedrms,
            population: f.population,
            ave_occup: f.ave_occup,
            latitude: f.latitude,
            longitude: f.longitude,
            prediction: e.prediction,
            model_id: e.model_id.as_deref(),
            model_version: &e.model_version,
            latency_ms: e.latency_ms,
            success: e.success,
            error_code: e.error_code.as_deref(),
            error_detail: e.error_detail.as_deref(),
        }
    }
}

pub fn write_csv(path: &Path, events: &[PredictionEvent]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    for event in events {
        wtr.serialize(ExportRow::from(event))
            .context("Failed to serialize event")?;
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

pub fn write_json(path: &Path, events: &[PredictionEvent]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), events)
        .context("Failed to serialize events")?;
    Ok(())
}

/// Write `events` to a timestamped file under `dir`. Returns `None` when
/// there is nothing to export.
pub fn export_events(
    events: &[PredictionEvent],
    format: ExportFormat,
    dir: &Path,
) -> Result<Option<PathBuf>> {
    if events.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!(
        "predictions_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    ));

    match format {
        ExportFormat::Csv => write_csv(&path, events)?,
        ExportFormat::Json => write_json(&path, events)?,
    }

    info!("Exported {} events to {}", events.len(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PredictionError;
    use crate::domain::housing::features::HousingFeatures;

    fn events() -> Vec<PredictionEvent> {
        vec![PredictionEvent::failure(
            HousingFeatures::default(),
            &PredictionError::inference("bad, \"quoted\" input"),
            None,
            std::time::Duration::from_millis(3),
        )]
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("housing-export-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_csv_export_has_wire_headers() {
        let dir = temp_dir();
        let path = export_events(&events(), ExportFormat::Csv, &dir)
            .unwrap()
            .unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert!(headers.iter().any(|h| h == "MedInc"));
        assert!(headers.iter().any(|h| h == "error_code"));
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_json_export_is_readable() {
        let dir = temp_dir();
        let original = events();
        let path = export_events(&original, ExportFormat::Json, &dir)
            .unwrap()
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: Vec<PredictionEvent> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].event_id, original[0].event_id);
        assert_eq!(parsed[0].error_code.as_deref(), Some("inference_error"));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_nothing_to_export() {
        assert!(
            export_events(&[], ExportFormat::Json, &temp_dir())
                .unwrap()
                .is_none()
        );
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
