use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Classification bucket for a finished request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Success,
    HttpError,
    NetworkError,
    Timeout,
    /// Force-failed by the abort path after the grace period ran out.
    Cancelled,
}

impl OutcomeCategory {
    pub const ALL: [OutcomeCategory; 5] = [
        OutcomeCategory::Success,
        OutcomeCategory::HttpError,
        OutcomeCategory::NetworkError,
        OutcomeCategory::Timeout,
        OutcomeCategory::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OutcomeCategory::Success => "success",
            OutcomeCategory::HttpError => "http_error",
            OutcomeCategory::NetworkError => "network_error",
            OutcomeCategory::Timeout => "timeout",
            OutcomeCategory::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            OutcomeCategory::Success => "Success",
            OutcomeCategory::HttpError => "HTTP Errors",
            OutcomeCategory::NetworkError => "Network Errors",
            OutcomeCategory::Timeout => "Timeouts",
            OutcomeCategory::Cancelled => "Cancelled",
        }
    }
}

/// Result of a single request attempt. Fields are fixed at construction.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    dispatch_time: Instant,
    completion_time: Instant,
    category: OutcomeCategory,
    status_code: Option<u16>,
    error_detail: Option<String>,
}

impl RequestOutcome {
    /// Outcome for a request that received a response.
    #[must_use]
    pub fn response(
        dispatch_time: Instant,
        completion_time: Instant,
        status_code: u16,
        category: OutcomeCategory,
    ) -> Self {
        let error_detail = match category {
            OutcomeCategory::Success => None,
            OutcomeCategory::HttpError
            | OutcomeCategory::NetworkError
            | OutcomeCategory::Timeout
            | OutcomeCategory::Cancelled => Some(format!("unexpected status {}", status_code)),
        };
        Self {
            dispatch_time,
            completion_time,
            category,
            status_code: Some(status_code),
            error_detail,
        }
    }

    /// Outcome for a request that failed before a usable response arrived.
    #[must_use]
    pub fn failure(
        dispatch_time: Instant,
        completion_time: Instant,
        category: OutcomeCategory,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            dispatch_time,
            completion_time,
            category,
            status_code: None,
            error_detail: Some(detail.into()),
        }
    }

    #[must_use]
    pub const fn dispatch_time(&self) -> Instant {
        self.dispatch_time
    }

    #[must_use]
    pub const fn completion_time(&self) -> Instant {
        self.completion_time
    }

    #[must_use]
    pub const fn category(&self) -> OutcomeCategory {
        self.category
    }

    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    #[must_use]
    pub fn latency(&self) -> Duration {
        self.completion_time
            .saturating_duration_since(self.dispatch_time)
    }

    #[must_use]
    pub fn latency_millis(&self) -> f64 {
        self.latency().as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub success: u64,
    pub http_error: u64,
    pub network_error: u64,
    pub timeout: u64,
    pub cancelled: u64,
}

impl CategoryCounts {
    #[must_use]
    pub const fn get(&self, category: OutcomeCategory) -> u64 {
        match category {
            OutcomeCategory::Success => self.success,
            OutcomeCategory::HttpError => self.http_error,
            OutcomeCategory::NetworkError => self.network_error,
            OutcomeCategory::Timeout => self.timeout,
            OutcomeCategory::Cancelled => self.cancelled,
        }
    }

    pub(crate) const fn increment(&mut self, category: OutcomeCategory) {
        let slot = match category {
            OutcomeCategory::Success => &mut self.success,
            OutcomeCategory::HttpError => &mut self.http_error,
            OutcomeCategory::NetworkError => &mut self.network_error,
            OutcomeCategory::Timeout => &mut self.timeout,
            OutcomeCategory::Cancelled => &mut self.cancelled,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.success
            .saturating_add(self.http_error)
            .saturating_add(self.network_error)
            .saturating_add(self.timeout)
            .saturating_add(self.cancelled)
    }

    /// Every outcome that was not a success.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.total().saturating_sub(self.success)
    }
}

/// Latency summary in milliseconds.
///
/// Percentiles come from an HDR histogram with three significant digits, so
/// they are approximate (relative error below 0.1%). Min, max and mean are
/// exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub total_dispatched: u64,
    pub total_completed: u64,
    pub counts: CategoryCounts,
    pub status_counts: BTreeMap<u16, u64>,
    pub latency: LatencySummary,
    pub finalized: bool,
}

impl RunStatistics {
    /// Requests dispatched but not yet recorded.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.total_dispatched.saturating_sub(self.total_completed)
    }

    #[must_use]
    pub const fn success_rate(&self) -> f64 {
        if self.total_completed == 0 {
            return 0.0;
        }
        self.counts.success as f64 / self.total_completed as f64
    }
}
