pub mod features;
pub mod validation;

pub use features::{FeatureRecord, HousingFeatures, INPUT_FEATURES};
pub use validation::Validator;
