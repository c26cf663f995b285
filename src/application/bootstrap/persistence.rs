use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::{ServerEnvConfig, StorageMode};
use crate::domain::repositories::PredictionEventRepository;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::SqlitePredictionEventRepository;
use crate::infrastructure::repositories::InMemoryPredictionEventRepository;

pub struct PersistenceHandle {
    /// `None` in memory mode
    pub db: Option<Database>,
    pub event_repository: Arc<dyn PredictionEventRepository>,
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    pub async fn init(config: &ServerEnvConfig) -> Result<PersistenceHandle> {
        match config.mode {
            StorageMode::Sqlite => {
                info!("Initializing Database at {}", config.database_url);
                let db = Database::new(&config.database_url)
                    .await
                    .context("Failed to initialize database")?;
                let event_repository = Arc::new(SqlitePredictionEventRepository::new(db.pool.clone()));

                Ok(PersistenceHandle {
                    db: Some(db),
                    event_repository,
                })
            }
            StorageMode::Memory => {
                info!("Using in-memory event store (events are lost on restart)");
                Ok(PersistenceHandle {
                    db: None,
                    event_repository: Arc::new(InMemoryPredictionEventRepository::new()),
                })
            }
        }
    }
}
