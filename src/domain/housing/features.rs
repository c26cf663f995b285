use serde::{Deserialize, Serialize};

/// Raw request payload: named numeric features as received on the wire
pub type FeatureRecord = serde_json::Map<String, serde_json::Value>;

/// Input feature names in declaration order (wire names).
pub const INPUT_FEATURES: [&str; 8] = [
    "MedInc",
    "HouseAge",
    "AveRooms",
    "AveBedrms",
    "Population",
    "AveOccup",
    "Latitude",
    "Longitude",
];

/// A feature record that passed validation.
///
/// Field order mirrors `INPUT_FEATURES`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HousingFeatures {
    #[serde(rename = "MedInc")]
    pub med_inc: f64,
    #[serde(rename = "HouseAge")]
    pub house_age: f64,
    #[serde(rename = "AveRooms")]
    pub ave_rooms: f64,
    #[serde(rename = "AveBedrms")]
    pub ave_bedrms: f64,
    #[serde(rename = "Population")]
    pub population: f64,
    #[serde(rename = "AveOccup")]
    pub ave_occup: f64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

impl HousingFeatures {
    pub fn from_values(values: [f64; 8]) -> Self {
        let [
            med_inc,
            house_age,
            ave_rooms,
            ave_bedrms,
            population,
            ave_occup,
            latitude,
            longitude,
        ] = values;
        Self {
            med_inc,
            house_age,
            ave_rooms,
            ave_bedrms,
            population,
            ave_occup,
            latitude,
            longitude,
        }
    }

    pub fn values(&self) -> [f64; 8] {
        [
            self.med_inc,
            self.house_age,
            self.ave_rooms,
            self.ave_bedrms,
            self.population,
            self.ave_occup,
            self.latitude,
            self.longitude,
        ]
    }

    /// Look up a feature by its wire name
    pub fn get(&self, name: &str) -> Option<f64> {
        INPUT_FEATURES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values()[idx])
    }

    /// Named pairs in declaration order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        INPUT_FEATURES.into_iter().zip(self.values())
    }
}

impl Default for HousingFeatures {
    /// The sample block group from the public API docs.
    fn default() -> Self {
        Self {
            med_inc: 8.3252,
            house_age: 41.0,
            ave_rooms: 6.984127,
            ave_bedrms: 1.02381,
            population: 322.0,
            ave_occup: 2.555556,
            latitude: 37.88,
            longitude: -122.23,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip_through_record() {
        let features = HousingFeatures::default();
        let json = serde_json::to_value(features).unwrap();
        let record = json.as_object().unwrap();

        for name in INPUT_FEATURES {
            assert!(record.contains_key(name), "missing {name}");
        }
    }

    #[test]
    fn test_get_by_name() {
        let features = HousingFeatures::default();
        assert_eq!(features.get("Latitude"), Some(37.88));
        assert_eq!(features.get("latitude"), None);
        assert_eq!(features.named().count(), 8);
    }
}
