//! Repository abstractions for the prediction event log.
//!
//! The log is append-only. Writers go through `append`; readers stream
//! matching events oldest first so analysis never has to hold more than
//! one window in memory.

use crate::domain::errors::PersistenceError;
use crate::domain::monitoring::event::{EventFilter, PredictionEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

/// Durable, append-only store of prediction events
#[async_trait]
pub trait PredictionEventRepository: Send + Sync {
    /// Persist one event. Once this returns Ok the event is visible to `query`.
    async fn append(&self, event: &PredictionEvent) -> Result<(), PersistenceError>;

    /// Stream events matching `filter` in ascending timestamp order
    fn query(&self, filter: EventFilter)
    -> BoxStream<'_, Result<PredictionEvent, PersistenceError>>;

    /// Drop events older than `cutoff`, returning how many were removed
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError>;
}
