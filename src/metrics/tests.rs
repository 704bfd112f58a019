use super::*;
use crate::error::CollectorError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn outcome_with_latency(
    category: OutcomeCategory,
    status: Option<u16>,
    latency: Duration,
) -> RequestOutcome {
    let dispatch = Instant::now();
    let completion = dispatch.checked_add(latency).unwrap_or(dispatch);
    match status {
        Some(status) => RequestOutcome::response(dispatch, completion, status, category),
        None => RequestOutcome::failure(dispatch, completion, category, "connection refused"),
    }
}

fn success(latency_ms: u64) -> RequestOutcome {
    outcome_with_latency(
        OutcomeCategory::Success,
        Some(200),
        Duration::from_millis(latency_ms),
    )
}

#[test]
fn concurrent_records_are_not_lost() -> Result<(), String> {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 250;

    let collector = Arc::new(ResultCollector::new());
    let mut handles = Vec::new();
    for thread_index in 0..THREADS {
        let collector = Arc::clone(&collector);
        handles.push(std::thread::spawn(move || -> Result<(), String> {
            for request in 0..PER_THREAD {
                collector
                    .note_dispatched()
                    .map_err(|err| err.to_string())?;
                let slot = thread_index.wrapping_add(request).checked_rem(4).unwrap_or(0);
                let category = OutcomeCategory::ALL
                    .get(usize::try_from(slot).unwrap_or(0))
                    .copied()
                    .unwrap_or(OutcomeCategory::Success);
                let status = match category {
                    OutcomeCategory::Success => Some(200),
                    OutcomeCategory::HttpError => Some(500),
                    OutcomeCategory::NetworkError
                    | OutcomeCategory::Timeout
                    | OutcomeCategory::Cancelled => None,
                };
                collector
                    .record(&outcome_with_latency(
                        category,
                        status,
                        Duration::from_millis(request.checked_rem(50).unwrap_or(0)),
                    ))
                    .map_err(|err| err.to_string())?;
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle
            .join()
            .map_err(|_panic| "recording thread panicked".to_owned())??;
    }

    let stats = collector.finalize();
    let expected = THREADS.saturating_mul(PER_THREAD);
    if stats.total_dispatched != expected || stats.total_completed != expected {
        return Err(format!(
            "Expected {} dispatched/completed, got {}/{}",
            expected, stats.total_dispatched, stats.total_completed
        ));
    }
    if stats.counts.total() != expected {
        return Err(format!(
            "Category counts sum to {}, expected {}",
            stats.counts.total(),
            expected
        ));
    }
    let status_total: u64 = stats.status_counts.values().sum();
    if status_total != stats.counts.success.saturating_add(stats.counts.http_error) {
        return Err(format!("Unexpected status total {}", status_total));
    }
    Ok(())
}

#[test]
fn record_after_finalize_is_rejected() -> Result<(), String> {
    let collector = ResultCollector::new();
    collector
        .record(&success(5))
        .map_err(|err| err.to_string())?;
    let stats = collector.finalize();
    if !stats.finalized || !collector.is_finalized() {
        return Err("Expected finalized statistics".to_owned());
    }

    match collector.record(&success(5)) {
        Err(CollectorError::AlreadyFinalized) => {}
        Ok(()) => return Err("Expected record to be rejected".to_owned()),
    }
    if collector.note_dispatched() != Err(CollectorError::AlreadyFinalized) {
        return Err("Expected dispatch count to be rejected".to_owned());
    }
    if collector.snapshot().total_completed != 1 {
        return Err("Rejected outcome changed the statistics".to_owned());
    }
    Ok(())
}

#[test]
fn snapshot_after_finalize_is_stable() -> Result<(), String> {
    let collector = ResultCollector::new();
    for latency in [3, 9, 27] {
        collector
            .note_dispatched()
            .map_err(|err| err.to_string())?;
        collector
            .record(&success(latency))
            .map_err(|err| err.to_string())?;
    }
    let finalized = collector.finalize();
    let first = collector.snapshot();
    let second = collector.snapshot();
    if first != second || first != finalized {
        return Err(format!(
            "Snapshots differ after finalize: {:?} vs {:?}",
            first, second
        ));
    }
    if collector.finalize() != finalized {
        return Err("Second finalize returned different statistics".to_owned());
    }
    Ok(())
}

#[test]
fn snapshot_is_a_frozen_copy() -> Result<(), String> {
    let collector = ResultCollector::new();
    collector
        .record(&success(10))
        .map_err(|err| err.to_string())?;
    let before = collector.snapshot();
    collector
        .record(&success(20))
        .map_err(|err| err.to_string())?;
    if before.total_completed != 1 || before.finalized {
        return Err(format!("Snapshot changed after the fact: {:?}", before));
    }
    if collector.snapshot().total_completed != 2 {
        return Err("Live snapshot missed an outcome".to_owned());
    }
    Ok(())
}

#[test]
fn latency_summary_tracks_min_mean_max_and_percentiles() -> Result<(), String> {
    let collector = ResultCollector::new();
    for latency in 1..=100 {
        collector
            .record(&success(latency))
            .map_err(|err| err.to_string())?;
    }
    let latency = collector.snapshot().latency;

    if (latency.min_ms - 1.0).abs() > 1e-6 || (latency.max_ms - 100.0).abs() > 1e-6 {
        return Err(format!("Unexpected min/max: {:?}", latency));
    }
    if (latency.mean_ms - 50.5).abs() > 1e-6 {
        return Err(format!("Unexpected mean: {}", latency.mean_ms));
    }
    // Three significant figures: within 0.1% plus one bucket.
    let close = |actual: f64, expected: f64| (actual - expected).abs() <= expected * 0.002;
    if !close(latency.p50_ms, 50.0) || !close(latency.p90_ms, 90.0) || !close(latency.p99_ms, 99.0)
    {
        return Err(format!("Unexpected percentiles: {:?}", latency));
    }
    if latency.p95_ms < latency.p90_ms || latency.p99_ms < latency.p95_ms {
        return Err(format!("Percentiles not monotonic: {:?}", latency));
    }
    Ok(())
}

#[test]
fn empty_collector_reports_zeroes() -> Result<(), String> {
    let stats = ResultCollector::new().finalize();
    if stats.latency != LatencySummary::default() || stats.success_rate() != 0.0 {
        return Err(format!("Expected empty statistics, got {:?}", stats));
    }
    Ok(())
}

#[test]
fn status_codes_and_failures_are_counted() -> Result<(), String> {
    let collector = ResultCollector::new();
    let outcomes = [
        outcome_with_latency(OutcomeCategory::Success, Some(200), Duration::from_millis(2)),
        outcome_with_latency(OutcomeCategory::Success, Some(204), Duration::from_millis(2)),
        outcome_with_latency(OutcomeCategory::HttpError, Some(503), Duration::from_millis(2)),
        outcome_with_latency(OutcomeCategory::HttpError, Some(503), Duration::from_millis(2)),
        outcome_with_latency(OutcomeCategory::Timeout, None, Duration::from_millis(30)),
        outcome_with_latency(OutcomeCategory::NetworkError, None, Duration::from_millis(1)),
    ];
    for outcome in &outcomes {
        collector.record(outcome).map_err(|err| err.to_string())?;
    }

    let stats = collector.snapshot();
    if stats.status_counts.get(&503) != Some(&2) || stats.status_counts.get(&204) != Some(&1) {
        return Err(format!("Unexpected status counts: {:?}", stats.status_counts));
    }
    if stats.counts.failures() != 4 || collector.count(OutcomeCategory::Timeout) != 1 {
        return Err(format!("Unexpected category counts: {:?}", stats.counts));
    }
    if (stats.success_rate() - 2.0 / 6.0).abs() > 1e-9 {
        return Err(format!("Unexpected success rate: {}", stats.success_rate()));
    }
    Ok(())
}

#[test]
fn outcome_latency_and_detail() -> Result<(), String> {
    let outcome = outcome_with_latency(
        OutcomeCategory::HttpError,
        Some(404),
        Duration::from_micros(1500),
    );
    if (outcome.latency_millis() - 1.5).abs() > 1e-9 {
        return Err(format!("Unexpected latency: {}", outcome.latency_millis()));
    }
    if outcome.error_detail() != Some("unexpected status 404") {
        return Err(format!("Unexpected detail: {:?}", outcome.error_detail()));
    }
    let ok = success(1);
    if ok.error_detail().is_some() || ok.status_code() != Some(200) {
        return Err("Success outcome should carry a status and no detail".to_owned());
    }
    Ok(())
}

#[test]
fn histogram_reports_zero_when_empty() -> Result<(), String> {
    let mut histogram = LatencyHistogram::new().map_err(|err| err.to_string())?;
    if histogram.quantile_ms(0.5) != 0.0 {
        return Err("Expected 0 for an empty histogram".to_owned());
    }
    histogram.record(0).map_err(|err| err.to_string())?;
    if histogram.count() != 1 || histogram.quantile_ms(1.0) <= 0.0 {
        return Err("Zero latency should be floored to one microsecond".to_owned());
    }
    Ok(())
}
