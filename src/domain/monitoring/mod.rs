pub mod baseline;
pub mod drift;
pub mod event;
pub mod health;
pub mod policy;
pub mod window;

pub use baseline::{BaselineDistribution, FeatureBaseline};
pub use drift::DriftMethod;
pub use event::{EventFilter, PredictionEvent};
pub use health::{HealthSnapshot, HealthStatus};
pub use policy::MonitoringPolicy;
pub use window::{RollingWindow, WindowSpec};
