use crate::domain::errors::PersistenceError;
use crate::domain::housing::features::HousingFeatures;
use crate::domain::monitoring::event::{EventFilter, PredictionEvent};
use crate::domain::repositories::PredictionEventRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Newest-N selection is done in the inner query, the outer one restores
/// ascending order. `LIMIT -1` means unbounded in SQLite.
const QUERY_EVENTS: &str = r#"
    SELECT * FROM (
        SELECT id, event_id, timestamp, input_features, prediction, model_id,
               model_version, latency_ms, success, error_code, error_detail
        FROM prediction_events
        WHERE (?1 IS NULL OR timestamp >= ?1)
          AND (?2 IS NULL OR timestamp <= ?2)
          AND (?3 IS NULL OR model_version = ?3)
        ORDER BY timestamp DESC, id DESC
        LIMIT ?4
    )
    ORDER BY timestamp ASC, id ASC
"#;

pub struct SqlitePredictionEventRepository {
    pool: SqlitePool,
}

impl SqlitePredictionEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<u64, PersistenceError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prediction_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

fn corrupt(reason: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Corrupt {
        reason: reason.to_string(),
    }
}

fn event_from_row(row: &SqliteRow) -> Result<PredictionEvent, PersistenceError> {
    let event_id: String = row.try_get("event_id")?;
    let timestamp: i64 = row.try_get("timestamp")?;
    let input_features: String = row.try_get("input_features")?;

    let features: HousingFeatures = serde_json::from_str(&input_features)
        .map_err(|e| corrupt(format!("event {}: bad input_features: {}", event_id, e)))?;

    Ok(PredictionEvent {
        event_id: Uuid::parse_str(&event_id)
            .map_err(|e| corrupt(format!("bad event_id {}: {}", event_id, e)))?,
        timestamp: DateTime::<Utc>::from_timestamp_micros(timestamp)
            .ok_or_else(|| corrupt(format!("event {}: bad timestamp {}", event_id, timestamp)))?,
        features,
        prediction: row.try_get("prediction")?,
        model_id: row.try_get("model_id")?,
        model_version: row.try_get("model_version")?,
        latency_ms: row.try_get("latency_ms")?,
        success: row.try_get("success")?,
        error_code: row.try_get("error_code")?,
        error_detail: row.try_get("error_detail")?,
    })
}

#[async_trait]
impl PredictionEventRepository for SqlitePredictionEventRepository {
    async fn append(&self, event: &PredictionEvent) -> Result<(), PersistenceError> {
        let features = serde_json::to_string(&event.features).map_err(corrupt)?;

        sqlx::query(
            r#"
            INSERT INTO prediction_events
            (event_id, timestamp, input_features, prediction, model_id, model_version,
             latency_ms, success, error_code, error_detail)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.event_id.to_string())
        .bind(event.timestamp.timestamp_micros())
        .bind(features)
        .bind(event.prediction)
        .bind(&event.model_id)
        .bind(&event.model_version)
        .bind(event.latency_ms)
        .bind(event.success)
        .bind(&event.error_code)
        .bind(&event.error_detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn query(
        &self,
        filter: EventFilter,
    ) -> BoxStream<'_, Result<PredictionEvent, PersistenceError>> {
        let limit = filter.latest.map(|n| n as i64).unwrap_or(-1);

        sqlx::query(QUERY_EVENTS)
            .bind(filter.since.map(|t| t.timestamp_micros()))
            .bind(filter.until.map(|t| t.timestamp_micros()))
            .bind(filter.model_version)
            .bind(limit)
            .fetch(&self.pool)
            .map(|row| {
                let row = row?;
                event_from_row(&row)
            })
            .boxed()
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let result = sqlx::query("DELETE FROM prediction_events WHERE timestamp < ?")
            .bind(cutoff.timestamp_micros())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
