pub mod model_store;
pub mod scaler;
pub mod smartcore_predictor;
pub mod training_data;

pub use model_store::FileModelProvider;
pub use scaler::StandardScaler;
pub use smartcore_predictor::SmartCorePredictor;
