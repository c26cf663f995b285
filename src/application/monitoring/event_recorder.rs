use crate::domain::errors::PersistenceError;
use crate::domain::monitoring::event::{EventFilter, PredictionEvent};
use crate::domain::repositories::PredictionEventRepository;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Append-only front of the event store.
///
/// Writes are serialized and bounded by `timeout`; reads go straight to the
/// repository.
pub struct EventRecorder {
    repository: Arc<dyn PredictionEventRepository>,
    write_lock: Mutex<()>,
    timeout: Duration,
}

impl EventRecorder {
    pub fn new(repository: Arc<dyn PredictionEventRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
            timeout,
        }
    }

    /// Persist one event. Time spent waiting for the write lock counts
    /// against the timeout.
    ///
    /// A timeout drops the write from the caller's point of view only: a
    /// store that already started the insert (SQLite) may still commit it.
    /// An `Err` therefore means "possibly not persisted", and the persistence
    /// error counter can over-count events that did land.
    pub async fn record(&self, event: &PredictionEvent) -> Result<(), PersistenceError> {
        let write = async {
            let _guard = self.write_lock.lock().await;
            self.repository.append(event).await
        };

        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(())) => {
                debug!("EventRecorder: recorded {}", event.event_id);
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("EventRecorder: failed to record {}: {}", event.event_id, e);
                Err(e)
            }
            Err(_) => {
                let err = PersistenceError::Timeout {
                    duration_ms: self.timeout.as_millis() as u64,
                };
                warn!("EventRecorder: dropped {}: {}", event.event_id, err);
                Err(err)
            }
        }
    }

    /// Lazy, ascending stream of matching events
    pub fn query(
        &self,
        filter: EventFilter,
    ) -> BoxStream<'_, Result<PredictionEvent, PersistenceError>> {
        self.repository.query(filter)
    }

    pub async fn collect(
        &self,
        filter: EventFilter,
    ) -> Result<Vec<PredictionEvent>, PersistenceError> {
        self.repository.query(filter).try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::housing::features::HousingFeatures;
    use crate::domain::ml::model::{ConfidenceInterval, PredictionOutcome};
    use crate::infrastructure::mock::SlowEventRepository;
    use crate::infrastructure::repositories::InMemoryPredictionEventRepository;

    fn event() -> PredictionEvent {
        let outcome = PredictionOutcome {
            predicted_value: 4.5,
            model_id: "m".to_string(),
            model_version: "v1".to_string(),
            latency: Duration::from_millis(2),
            interval: ConfidenceInterval::around(4.5),
        };
        PredictionEvent::success(HousingFeatures::default(), &outcome)
    }

    #[tokio::test]
    async fn test_recorded_event_is_visible() {
        let recorder = EventRecorder::new(
            Arc::new(InMemoryPredictionEventRepository::new()),
            Duration::from_millis(200),
        );
        let e = event();
        recorder.record(&e).await.unwrap();

        let events = recorder.collect(EventFilter::all()).await.unwrap();
        assert_eq!(events, vec![e]);
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let recorder = EventRecorder::new(
            Arc::new(SlowEventRepository::new(Duration::from_millis(500))),
            Duration::from_millis(20),
        );

        let err = recorder.record(&event()).await.unwrap_err();
        assert_eq!(err, PersistenceError::Timeout { duration_ms: 20 });
        assert!(recorder.collect(EventFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writes_all_land() {
        let recorder = Arc::new(EventRecorder::new(
            Arc::new(InMemoryPredictionEventRepository::new()),
            Duration::from_secs(1),
        ));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let recorder = recorder.clone();
                tokio::spawn(async move { recorder.record(&event()).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(recorder.collect(EventFilter::all()).await.unwrap().len(), 20);
    }
}
