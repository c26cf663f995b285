pub mod orchestrator;

pub use orchestrator::{PredictionService, RequestState, ServeOutcome, Served, ServingConfig};
