//! Request outcomes, latency histograms, and run statistics aggregation.
mod collector;
mod histogram;
mod types;

#[cfg(test)]
mod tests;

pub use collector::ResultCollector;
pub use histogram::LatencyHistogram;
pub use types::{CategoryCounts, LatencySummary, OutcomeCategory, RequestOutcome, RunStatistics};
