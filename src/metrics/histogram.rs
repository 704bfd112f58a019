use hdrhistogram::Histogram;

use crate::error::MetricsError;

/// Significant figures kept by the histogram (bounded relative error 0.1%).
const SIGNIFICANT_FIGURES: u8 = 3;
const MICROS_PER_MILLI: f64 = 1000.0;

/// Latency histogram recorded in microseconds.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new auto-resizing latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist =
            Histogram::<u64>::new(SIGNIFICANT_FIGURES).map_err(|err| MetricsError::Histogram {
                context: "create",
                source: Box::new(err),
            })?;
        Ok(Self { hist })
    }

    /// Record a latency value in microseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency_us: u64) -> Result<(), MetricsError> {
        let value = latency_us.max(1);
        self.hist
            .record(value)
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    /// Latency at `quantile` (0.0..=1.0) in milliseconds, or 0 when empty.
    #[must_use]
    pub fn quantile_ms(&self, quantile: f64) -> f64 {
        if self.count() == 0 {
            return 0.0;
        }
        self.hist.value_at_quantile(quantile) as f64 / MICROS_PER_MILLI
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }
}
