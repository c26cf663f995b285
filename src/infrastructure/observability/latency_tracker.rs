use prometheus::HistogramVec;
use std::time::Instant;

/// Outcome recorded when a guard is dropped before `finish` (e.g. the
/// request future was cancelled)
pub const ABORTED_OUTCOME: &str = "aborted";

/// RAII guard recording elapsed time under an outcome label
pub struct LatencyGuard {
    start: Instant,
    histogram: HistogramVec,
    outcome: &'static str,
}

impl LatencyGuard {
    pub fn new(histogram: HistogramVec) -> Self {
        Self {
            start: Instant::now(),
            histogram,
            outcome: ABORTED_OUTCOME,
        }
    }

    pub fn set_outcome(&mut self, outcome: &'static str) {
        self.outcome = outcome;
    }
}

impl Drop for LatencyGuard {
    fn drop(&mut self) {
        self.histogram
            .with_label_values(&[self.outcome])
            .observe(self.start.elapsed().as_secs_f64());
    }
}
