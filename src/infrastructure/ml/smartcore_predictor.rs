use crate::domain::ml::model::EstimatorKind;
use crate::domain::ports::Regressor;
use anyhow::{Context, Result};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::LinearRegression;

type LinearModel = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

enum Estimator {
    Linear(LinearModel),
    Forest(ForestModel),
}

/// smartcore estimator deserialized from its serde JSON artifact
pub struct SmartCorePredictor {
    estimator: Estimator,
    name: String,
}

impl SmartCorePredictor {
    pub fn from_json(kind: EstimatorKind, raw: &[u8]) -> Result<Self> {
        let estimator = match kind {
            EstimatorKind::LinearRegression => Estimator::Linear(
                serde_json::from_slice(raw).context("Failed to deserialize linear regression")?,
            ),
            EstimatorKind::RandomForest => Estimator::Forest(
                serde_json::from_slice(raw).context("Failed to deserialize random forest")?,
            ),
        };
        Ok(Self {
            estimator,
            name: format!("smartcore {}", kind),
        })
    }

    pub fn linear(model: LinearModel) -> Self {
        Self {
            estimator: Estimator::Linear(model),
            name: format!("smartcore {}", EstimatorKind::LinearRegression),
        }
    }
}

impl Regressor for SmartCorePredictor {
    fn predict(&self, features: &[f64]) -> Result<f64, String> {
        let input_matrix = match DenseMatrix::from_2d_vec(&vec![features.to_vec()]) {
            Ok(m) => m,
            Err(e) => return Err(format!("Matrix creation failed: {}", e)),
        };

        let predictions = match &self.estimator {
            Estimator::Linear(model) => model.predict(&input_matrix),
            Estimator::Forest(model) => model.predict(&input_matrix),
        };

        match predictions {
            Ok(predictions) => predictions
                .first()
                .copied()
                .ok_or_else(|| "No prediction returned".to_string()),
            Err(e) => Err(format!("Prediction failed: {}", e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
