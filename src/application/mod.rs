// Service wiring
pub mod bootstrap;
pub mod system;

// Model lifecycle and inference
pub mod ml;

// Event recording and health monitoring
pub mod monitoring;

// Request orchestration
pub mod serving;
