use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::CollectorError;

use super::{
    CategoryCounts, LatencyHistogram, LatencySummary, OutcomeCategory, RequestOutcome,
    RunStatistics,
};

/// Aggregates request outcomes into [`RunStatistics`].
///
/// Safe to share between tasks: every mutation goes through one mutex, which
/// is never held across an await point. Outcomes are folded into counters and
/// a latency histogram on arrival and are not retained individually.
#[derive(Debug)]
pub struct ResultCollector {
    state: Mutex<CollectorState>,
}

#[derive(Debug)]
struct CollectorState {
    total_dispatched: u64,
    total_completed: u64,
    counts: CategoryCounts,
    status_counts: BTreeMap<u16, u64>,
    latency_sum: Duration,
    min_latency: Option<Duration>,
    max_latency: Duration,
    histogram: Option<LatencyHistogram>,
    sealed: Option<RunStatistics>,
}

impl CollectorState {
    fn new() -> Self {
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                tracing::warn!("Failed to initialize latency histogram: {}", err);
                None
            }
        };
        Self {
            total_dispatched: 0,
            total_completed: 0,
            counts: CategoryCounts::default(),
            status_counts: BTreeMap::new(),
            latency_sum: Duration::ZERO,
            min_latency: None,
            max_latency: Duration::ZERO,
            histogram,
            sealed: None,
        }
    }

    fn apply(&mut self, outcome: &RequestOutcome) {
        let latency = outcome.latency();
        self.total_completed = self.total_completed.saturating_add(1);
        self.counts.increment(outcome.category());
        if let Some(status) = outcome.status_code() {
            let entry = self.status_counts.entry(status).or_insert(0);
            *entry = entry.saturating_add(1);
        }
        self.latency_sum = self.latency_sum.saturating_add(latency);
        self.min_latency = Some(
            self.min_latency
                .map_or(latency, |current| current.min(latency)),
        );
        self.max_latency = self.max_latency.max(latency);
        if let Some(histogram) = self.histogram.as_mut() {
            let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
            if let Err(err) = histogram.record(micros) {
                tracing::warn!("Failed to record latency: {}", err);
            }
        }
    }

    fn statistics(&self) -> RunStatistics {
        if let Some(sealed) = self.sealed.as_ref() {
            return sealed.clone();
        }
        RunStatistics {
            total_dispatched: self.total_dispatched,
            total_completed: self.total_completed,
            counts: self.counts,
            status_counts: self.status_counts.clone(),
            latency: self.latency_summary(),
            finalized: false,
        }
    }

    fn latency_summary(&self) -> LatencySummary {
        if self.total_completed == 0 {
            return LatencySummary::default();
        }
        let mean_ms = self.latency_sum.as_secs_f64() * 1000.0 / self.total_completed as f64;
        let (p50_ms, p90_ms, p95_ms, p99_ms) = self.histogram.as_ref().map_or(
            (0.0, 0.0, 0.0, 0.0),
            |histogram| {
                (
                    histogram.quantile_ms(0.50),
                    histogram.quantile_ms(0.90),
                    histogram.quantile_ms(0.95),
                    histogram.quantile_ms(0.99),
                )
            },
        );
        LatencySummary {
            min_ms: millis(self.min_latency.unwrap_or_default()),
            max_ms: millis(self.max_latency),
            mean_ms,
            p50_ms,
            p90_ms,
            p95_ms,
            p99_ms,
        }
    }
}

const fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectorState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        // Updates never leave a counter half-written; poisoning is ignored.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one dispatched request.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::AlreadyFinalized`] after [`Self::finalize`].
    pub fn note_dispatched(&self) -> Result<(), CollectorError> {
        let mut state = self.lock();
        if state.sealed.is_some() {
            return Err(CollectorError::AlreadyFinalized);
        }
        state.total_dispatched = state.total_dispatched.saturating_add(1);
        Ok(())
    }

    /// Fold one outcome into the running statistics.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::AlreadyFinalized`] after [`Self::finalize`].
    pub fn record(&self, outcome: &RequestOutcome) -> Result<(), CollectorError> {
        let mut state = self.lock();
        if state.sealed.is_some() {
            return Err(CollectorError::AlreadyFinalized);
        }
        state.apply(outcome);
        Ok(())
    }

    /// Consistent copy of the statistics at call time.
    #[must_use]
    pub fn snapshot(&self) -> RunStatistics {
        self.lock().statistics()
    }

    /// Seal the collector and return the final statistics.
    ///
    /// Calling it again returns the same sealed statistics.
    #[must_use]
    pub fn finalize(&self) -> RunStatistics {
        let mut state = self.lock();
        if let Some(sealed) = state.sealed.as_ref() {
            return sealed.clone();
        }
        let mut statistics = state.statistics();
        statistics.finalized = true;
        state.sealed = Some(statistics.clone());
        statistics
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.lock().sealed.is_some()
    }

    #[must_use]
    pub fn count(&self, category: OutcomeCategory) -> u64 {
        self.lock().counts.get(category)
    }
}
