use crate::domain::housing::features::HousingFeatures;

/// Ordered list of model input columns.
/// This order MUST match the column order the estimator and scaler were fitted on.
/// Any change here is a breaking change for stored models.
pub const MODEL_FEATURES: &[&str] = &[
    "MedInc",
    "HouseAge",
    "AveRooms",
    "AveBedrms",
    "Population",
    "AveOccup",
    "Latitude",
    "Longitude",
    "rooms_per_household",
    "bedrooms_per_room",
    "population_per_household",
];

/// Expands validated inputs with the engineered ratio columns.
///
/// Non-finite ratios fall back to `fallbacks[i]` (the training mean of that
/// column) the same way training filled them.
pub fn engineered_vector(fs: &HousingFeatures, fallbacks: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(MODEL_FEATURES.len());
    out.extend_from_slice(&fs.values());

    let ratios = [
        fs.ave_rooms / fs.ave_occup,
        fs.ave_bedrms / fs.ave_rooms,
        fs.population / fs.ave_occup,
    ];

    for ratio in ratios {
        let idx = out.len();
        if ratio.is_finite() {
            out.push(ratio);
        } else {
            out.push(fallbacks.get(idx).copied().unwrap_or(0.0));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_length() {
        let fs = HousingFeatures::default();
        let vec = engineered_vector(&fs, &[]);
        assert_eq!(vec.len(), MODEL_FEATURES.len());
    }

    #[test]
    fn test_engineered_columns() {
        let fs = HousingFeatures {
            ave_rooms: 6.0,
            ave_bedrms: 1.5,
            population: 900.0,
            ave_occup: 3.0,
            ..Default::default()
        };

        let vec = engineered_vector(&fs, &[]);
        assert_eq!(vec[8], 2.0);
        assert_eq!(vec[9], 0.25);
        assert_eq!(vec[10], 300.0);
    }

    #[test]
    fn test_non_finite_ratio_uses_fallback() {
        let fs = HousingFeatures {
            ave_occup: 0.0,
            ..Default::default()
        };
        let fallbacks = vec![0.0; 8]
            .into_iter()
            .chain([5.4, 0.21, 3.1])
            .collect::<Vec<_>>();

        let vec = engineered_vector(&fs, &fallbacks);
        assert_eq!(vec[8], 5.4);
        assert_eq!(vec[10], 3.1);
    }
}
