use crate::domain::monitoring::event::{EventFilter, PredictionEvent};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// How much event history an analysis cycle looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSpec {
    LastEvents { count: usize },
    LastDuration { seconds: i64 },
}

impl WindowSpec {
    pub fn last_events(count: usize) -> Self {
        WindowSpec::LastEvents { count }
    }

    pub fn last_minutes(minutes: i64) -> Self {
        WindowSpec::LastDuration {
            seconds: minutes.saturating_mul(60),
        }
    }

    /// Oldest timestamp inside a time window ending at `now`. `None` means
    /// the window reaches past the earliest representable instant.
    fn start(seconds: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Duration::try_seconds(seconds.max(0)).and_then(|span| now.checked_sub_signed(span))
    }

    /// Store filter selecting this window as of `now`
    pub fn filter(&self, now: DateTime<Utc>) -> EventFilter {
        match *self {
            WindowSpec::LastEvents { count } => EventFilter::all().until(now).latest(count),
            WindowSpec::LastDuration { seconds } => match Self::start(seconds, now) {
                Some(since) => EventFilter::all().since(since).until(now),
                None => EventFilter::all().until(now),
            },
        }
    }
}

/// Bounded, oldest-first view over the event log at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    pub spec: WindowSpec,
    pub evaluated_at: DateTime<Utc>,
    events: Vec<PredictionEvent>,
}

impl RollingWindow {
    /// Builds the window, re-applying the bound so a loose input slice still
    /// yields exactly the spec's view.
    pub fn new(
        spec: WindowSpec,
        evaluated_at: DateTime<Utc>,
        mut events: Vec<PredictionEvent>,
    ) -> Self {
        events.retain(|e| e.timestamp <= evaluated_at);
        events.sort_by_key(|e| e.timestamp);

        match spec {
            WindowSpec::LastEvents { count } => {
                if events.len() > count {
                    events.drain(..events.len() - count);
                }
            }
            WindowSpec::LastDuration { seconds } => {
                if let Some(start) = WindowSpec::start(seconds, evaluated_at) {
                    events.retain(|e| e.timestamp >= start);
                }
            }
        }

        Self {
            spec,
            evaluated_at,
            events,
        }
    }

    pub fn events(&self) -> &[PredictionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(|e| e.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|e| e.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PredictionError;
    use crate::domain::housing::features::HousingFeatures;

    fn event_at(ts: DateTime<Utc>) -> PredictionEvent {
        PredictionEvent::failure(
            HousingFeatures::default(),
            &PredictionError::ModelUnavailable,
            None,
            std::time::Duration::ZERO,
        )
        .at(ts)
    }

    #[test]
    fn test_last_events_keeps_newest() {
        let now = Utc::now();
        let events: Vec<_> = (0..10)
            .map(|i| event_at(now - Duration::seconds(10 - i)))
            .collect();

        let window = RollingWindow::new(WindowSpec::last_events(3), now, events.clone());
        assert_eq!(window.len(), 3);
        assert_eq!(window.events()[0].event_id, events[7].event_id);
        assert_eq!(window.events()[2].event_id, events[9].event_id);
    }

    #[test]
    fn test_duration_window_drops_old_and_future_events() {
        let now = Utc::now();
        let events = vec![
            event_at(now - Duration::minutes(30)),
            event_at(now - Duration::minutes(2)),
            event_at(now + Duration::minutes(1)),
        ];

        let window = RollingWindow::new(WindowSpec::last_minutes(5), now, events);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_filter_for_count_window() {
        let now = Utc::now();
        let filter = WindowSpec::last_events(50).filter(now);
        assert_eq!(filter.latest, Some(50));
        assert_eq!(filter.until, Some(now));
        assert!(filter.since.is_none());
    }

    #[test]
    fn test_oversized_duration_window_covers_everything() {
        let now = Utc::now();
        for spec in [
            WindowSpec::last_minutes(i64::MAX / 100),
            WindowSpec::last_minutes(i64::MAX),
        ] {
            let filter = spec.filter(now);
            assert!(filter.since.is_none());
            assert_eq!(filter.until, Some(now));

            let old = event_at(now - Duration::days(3650));
            let window = RollingWindow::new(spec, now, vec![old]);
            assert_eq!(window.len(), 1);
        }
    }

    #[test]
    fn test_filter_for_duration_window() {
        let now = Utc::now();
        let filter = WindowSpec::last_minutes(15).filter(now);
        assert_eq!(filter.since, Some(now - Duration::minutes(15)));
        assert_eq!(filter.until, Some(now));
    }
}
