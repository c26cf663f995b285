use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::TryStreamExt;
use housing_sentinel::domain::errors::PredictionError;
use housing_sentinel::domain::housing::features::HousingFeatures;
use housing_sentinel::domain::ml::model::{ConfidenceInterval, PredictionOutcome};
use housing_sentinel::domain::monitoring::event::{EventFilter, PredictionEvent, now_micros};
use housing_sentinel::domain::repositories::PredictionEventRepository;
use housing_sentinel::infrastructure::persistence::{Database, SqlitePredictionEventRepository};
use std::path::PathBuf;
use tokio_test::{assert_err, assert_ok};
use std::time::Duration;
use uuid::Uuid;

struct TempDb {
    dir: PathBuf,
    repo: SqlitePredictionEventRepository,
}

impl Drop for TempDb {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

async fn temp_db() -> Result<TempDb> {
    let dir = std::env::temp_dir().join(format!("housing-store-{}", Uuid::new_v4()));
    let url = format!("sqlite://{}", dir.join("predictions.db").display());
    let db = Database::new(&url).await?;
    Ok(TempDb {
        dir,
        repo: SqlitePredictionEventRepository::new(db.pool.clone()),
    })
}

fn event(version: &str, at: DateTime<Utc>) -> PredictionEvent {
    let outcome = PredictionOutcome {
        predicted_value: 2.5,
        model_id: "mock-model".to_string(),
        model_version: version.to_string(),
        latency: Duration::from_micros(1500),
        interval: ConfidenceInterval::around(2.5),
    };
    PredictionEvent::success(HousingFeatures::default(), &outcome).at(at)
}

async fn ids(
    repo: &SqlitePredictionEventRepository,
    filter: EventFilter,
) -> Result<Vec<Uuid>> {
    let events: Vec<PredictionEvent> = repo.query(filter).try_collect().await?;
    Ok(events.into_iter().map(|e| e.event_id).collect())
}

#[tokio::test]
async fn test_append_is_visible_to_later_queries() -> Result<()> {
    let db = temp_db().await?;
    let written = event("1.0.0", now_micros());
    db.repo.append(&written).await?;

    let events: Vec<PredictionEvent> = db.repo.query(EventFilter::all()).try_collect().await?;
    assert_eq!(events.len(), 1);
    let read = &events[0];
    assert_eq!(read.event_id, written.event_id);
    assert_eq!(read.timestamp, written.timestamp);
    assert_eq!(read.model_version, "1.0.0");
    assert_eq!(read.model_id.as_deref(), Some("mock-model"));
    assert!(read.success);
    assert!(read.error_code.is_none());
    assert_eq!(db.repo.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_failures_keep_code_and_detail() -> Result<()> {
    let db = temp_db().await?;
    let failed = PredictionEvent::failure(
        HousingFeatures::default(),
        &PredictionError::ModelUnavailable,
        None,
        Duration::ZERO,
    );
    db.repo.append(&failed).await?;

    let events: Vec<PredictionEvent> = db.repo.query(EventFilter::all()).try_collect().await?;
    assert_eq!(events[0].prediction, None);
    assert!(!events[0].success);
    assert_eq!(events[0].error_code.as_deref(), Some("model_unavailable"));
    assert!(events[0].error_detail.is_some());
    Ok(())
}

#[tokio::test]
async fn test_queries_are_ordered_and_bounded() -> Result<()> {
    let db = temp_db().await?;
    let base = now_micros() - ChronoDuration::minutes(10);

    // Written out of order on purpose
    let events: Vec<PredictionEvent> = [3, 0, 4, 1, 2]
        .iter()
        .map(|m| event("1.0.0", base + ChronoDuration::minutes(*m)))
        .collect();
    for e in &events {
        db.repo.append(e).await?;
    }
    let by_minute = |m: usize| events[[1, 3, 4, 0, 2][m]].event_id;

    let all = ids(&db.repo, EventFilter::all()).await?;
    assert_eq!(all, (0..5).map(by_minute).collect::<Vec<_>>());

    let latest = ids(&db.repo, EventFilter::all().latest(2)).await?;
    assert_eq!(latest, vec![by_minute(3), by_minute(4)]);

    let range = ids(
        &db.repo,
        EventFilter::all()
            .since(base + ChronoDuration::minutes(1))
            .until(base + ChronoDuration::minutes(3)),
    )
    .await?;
    assert_eq!(range, vec![by_minute(1), by_minute(2), by_minute(3)]);
    Ok(())
}

#[tokio::test]
async fn test_model_version_filter() -> Result<()> {
    let db = temp_db().await?;
    let now = now_micros();
    let old = event("1.0.0", now - ChronoDuration::seconds(2));
    let new = event("2.0.0", now - ChronoDuration::seconds(1));
    db.repo.append(&old).await?;
    db.repo.append(&new).await?;

    let v2 = ids(&db.repo, EventFilter::all().model_version("2.0.0")).await?;
    assert_eq!(v2, vec![new.event_id]);
    Ok(())
}

#[tokio::test]
async fn test_purge_before_cutoff() -> Result<()> {
    let db = temp_db().await?;
    let now = now_micros();
    let stale = event("1.0.0", now - ChronoDuration::days(40));
    let fresh = event("1.0.0", now - ChronoDuration::days(1));
    db.repo.append(&stale).await?;
    db.repo.append(&fresh).await?;

    let deleted = db.repo.purge_before(now - ChronoDuration::days(30)).await?;
    assert_eq!(deleted, 1);
    assert_eq!(ids(&db.repo, EventFilter::all()).await?, vec![fresh.event_id]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_event_id_is_rejected() -> Result<()> {
    let db = temp_db().await?;
    let e = event("1.0.0", now_micros());
    assert_ok!(db.repo.append(&e).await);
    assert_err!(db.repo.append(&e).await);
    assert_eq!(db.repo.count().await?, 1);
    Ok(())
}
