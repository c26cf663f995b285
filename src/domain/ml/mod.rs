pub mod feature_registry;
pub mod model;

pub use model::{ActiveModel, ModelDescriptor, PredictionOutcome};
