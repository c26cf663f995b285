pub mod export;
pub mod ml;
pub mod mock;
pub mod observability;
pub mod persistence;
pub mod repositories;

pub use persistence::{Database, SqlitePredictionEventRepository};
pub use repositories::InMemoryPredictionEventRepository;
