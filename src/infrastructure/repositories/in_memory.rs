//! In-memory event repository.
//!
//! Thread-safe through `Arc<RwLock>`. Used by tests and by the server when
//! no database is configured. Data is lost on restart.

use crate::domain::errors::PersistenceError;
use crate::domain::monitoring::event::{EventFilter, PredictionEvent};
use crate::domain::repositories::PredictionEventRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct InMemoryPredictionEventRepository {
    events: Arc<RwLock<Vec<PredictionEvent>>>,
}

impl InMemoryPredictionEventRepository {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

impl Default for InMemoryPredictionEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictionEventRepository for InMemoryPredictionEventRepository {
    async fn append(&self, event: &PredictionEvent) -> Result<(), PersistenceError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    fn query(
        &self,
        filter: EventFilter,
    ) -> BoxStream<'_, Result<PredictionEvent, PersistenceError>> {
        let events = self.events.clone();

        stream::once(async move {
            let guard = events.read().await;
            let mut matching: Vec<PredictionEvent> =
                guard.iter().filter(|e| filter.matches(e)).cloned().collect();
            // Stable: equal timestamps keep append order
            matching.sort_by_key(|e| e.timestamp);
            if let Some(n) = filter.latest
                && matching.len() > n
            {
                matching.drain(..matching.len() - n);
            }
            stream::iter(matching.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.timestamp >= cutoff);
        Ok((before - events.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::housing::features::HousingFeatures;
    use crate::domain::ml::model::{ConfidenceInterval, PredictionOutcome};
    use chrono::Duration;
    use futures::TryStreamExt;

    fn event_at(ts: DateTime<Utc>, version: &str) -> PredictionEvent {
        let outcome = PredictionOutcome {
            predicted_value: 2.0,
            model_id: "m".to_string(),
            model_version: version.to_string(),
            latency: std::time::Duration::from_millis(3),
            interval: ConfidenceInterval::around(2.0),
        };
        PredictionEvent::success(HousingFeatures::default(), &outcome).at(ts)
    }

    #[tokio::test]
    async fn test_query_orders_and_bounds() {
        let repo = InMemoryPredictionEventRepository::new();
        let t0 = Utc::now();
        for offset in [3, 1, 2, 0] {
            repo.append(&event_at(t0 + Duration::seconds(offset), "v1"))
                .await
                .unwrap();
        }

        let all: Vec<_> = repo.query(EventFilter::all()).try_collect().await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let newest: Vec<_> = repo
            .query(EventFilter::all().latest(2))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].timestamp, t0 + Duration::seconds(2));
        assert_eq!(newest[1].timestamp, t0 + Duration::seconds(3));
    }

    #[tokio::test]
    async fn test_filter_by_version_and_purge() {
        let repo = InMemoryPredictionEventRepository::new();
        let t0 = Utc::now();
        repo.append(&event_at(t0, "v1")).await.unwrap();
        repo.append(&event_at(t0 + Duration::seconds(1), "v2"))
            .await
            .unwrap();

        let v2: Vec<_> = repo
            .query(EventFilter::all().model_version("v2"))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(v2.len(), 1);

        let removed = repo
            .purge_before(t0 + Duration::milliseconds(500))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.len().await, 1);
    }
}
