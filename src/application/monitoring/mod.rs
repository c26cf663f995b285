// Event log front, health analysis and reporting
pub mod event_recorder;
pub mod health_analyzer;
pub mod health_monitor;
pub mod prediction_stats;

pub use event_recorder::EventRecorder;
pub use health_analyzer::HealthAnalyzer;
pub use health_monitor::HealthMonitor;
