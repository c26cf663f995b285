use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared SQLite handle for the prediction event log
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal); // Readers don't block the writer

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prediction_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id TEXT NOT NULL UNIQUE,
                timestamp INTEGER NOT NULL,
                input_features TEXT NOT NULL,
                prediction REAL,
                model_version TEXT NOT NULL,
                latency_ms REAL NOT NULL,
                success BOOLEAN NOT NULL,
                error_detail TEXT
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create prediction_events table")?;

        // Migrations for logs written before model_id/error_code existed.
        // Errors mean the column is already there.
        let _ = sqlx::query("ALTER TABLE prediction_events ADD COLUMN model_id TEXT")
            .execute(&mut *conn)
            .await;
        let _ = sqlx::query("ALTER TABLE prediction_events ADD COLUMN error_code TEXT")
            .execute(&mut *conn)
            .await;

        // Window queries scan by time
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_prediction_events_time
            ON prediction_events (timestamp, id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create prediction_events index")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_prediction_events_version
            ON prediction_events (model_version, timestamp);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create model_version index")?;

        info!("Database schema initialized");
        Ok(())
    }
}
