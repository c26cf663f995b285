pub mod predictor_gateway;

pub use predictor_gateway::PredictorGateway;
