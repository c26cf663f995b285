// Domain-specific error types
pub mod errors;

// Request features and validation
pub mod housing;

// Model descriptors and feature engineering
pub mod ml;

// Event log, drift and health classification
pub mod monitoring;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;
