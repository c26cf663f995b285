//! Observability for the prediction service
//!
//! 1. **Prometheus metrics**: rendered on `GET /metrics`
//! 2. **Structured health logs**: a periodic `HEALTH_JSON:` line on stdout

pub mod latency_tracker;
pub mod metrics;
pub mod reporter;

pub use latency_tracker::LatencyGuard;
pub use metrics::{Metrics, MetricsDocument};
pub use reporter::HealthReporter;
