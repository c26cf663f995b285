use crate::domain::housing::features::HousingFeatures;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Target column of the California Housing dataset
pub const TARGET_COLUMN: &str = "MedHouseVal";

#[derive(Debug, Deserialize)]
struct TrainingRecord {
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
    #[serde(rename = "MedHouseVal", default)]
    target: Option<f64>,
}

impl TrainingRecord {
    fn features(&self) -> HousingFeatures {
        HousingFeatures::from_values([
            self.med_inc,
            self.house_age,
            self.ave_rooms,
            self.ave_bedrms,
            self.population,
            self.ave_occup,
            self.latitude,
            self.longitude,
        ])
    }
}

/// Reference rows (and targets, when the column is present) from a
/// training CSV with wire-named headers
pub fn read_training_rows<R: Read>(reader: R) -> Result<(Vec<HousingFeatures>, Vec<f64>)> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let has_target = headers.iter().any(|h| h == TARGET_COLUMN);

    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Bad CSV row {}", line + 2))?;
        let parsed: TrainingRecord = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Bad training record on row {}", line + 2))?;
        rows.push(parsed.features());
        if has_target && let Some(target) = parsed.target {
            targets.push(target);
        }
    }

    Ok((rows, targets))
}

pub fn read_training_csv(path: &Path) -> Result<(Vec<HousingFeatures>, Vec<f64>)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_training_rows(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
MedInc,HouseAge,AveRooms,AveBedrms,Population,AveOccup,Latitude,Longitude,MedHouseVal
8.3252,41,6.98,1.02,322,2.55,37.88,-122.23,4.526
7.2574,52,8.28,1.07,496,2.18,37.85,-122.24,3.585
";

    #[test]
    fn test_reads_rows_and_targets() {
        let (rows, targets) = read_training_rows(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].house_age, 52.0);
        assert_eq!(targets, vec![4.526, 3.585]);
    }

    #[test]
    fn test_target_column_optional() {
        let csv = "MedInc,HouseAge,AveRooms,AveBedrms,Population,AveOccup,Latitude,Longitude\n\
                   1,2,3,1,100,2,34,-118\n";
        let (rows, targets) = read_training_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(targets.is_empty());
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "MedInc,HouseAge\n1,2\n";
        assert!(read_training_rows(csv.as_bytes()).is_err());
    }
}
