use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use url::Url;

use crate::args::OutputFormat;
use crate::engine::RunReport;
use crate::error::AppResult;
use crate::metrics::OutcomeCategory;

/// Run facts the report itself does not carry.
#[derive(Debug, Clone)]
pub(crate) struct SummaryContext {
    pub(crate) method: String,
    pub(crate) target_url: Url,
    pub(crate) target_rate: f64,
    pub(crate) planned_requests: u64,
    pub(crate) started_at: DateTime<Local>,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    method: &'a str,
    target_url: &'a str,
    started_at: String,
    target_rate: f64,
    planned_requests: u64,
    achieved_rate: f64,
    #[serde(flatten)]
    report: &'a RunReport,
}

pub(crate) fn print_report(
    report: &RunReport,
    context: &SummaryContext,
    format: OutputFormat,
) -> AppResult<()> {
    match format {
        OutputFormat::Text => {
            for line in summary_lines(report, context) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", summary_json(report, context)?),
    }
    Ok(())
}

pub(crate) fn summary_json(
    report: &RunReport,
    context: &SummaryContext,
) -> Result<String, serde_json::Error> {
    let document = SummaryDocument {
        method: &context.method,
        target_url: context.target_url.as_str(),
        started_at: context
            .started_at
            .to_rfc3339_opts(SecondsFormat::Millis, false),
        target_rate: context.target_rate,
        planned_requests: context.planned_requests,
        achieved_rate: report.achieved_rate(),
        report,
    };
    serde_json::to_string_pretty(&document)
}

pub(crate) fn summary_lines(report: &RunReport, context: &SummaryContext) -> Vec<String> {
    let stats = &report.statistics;
    let mut lines = Vec::new();

    lines.push(format!("Target: {} {}", context.method, context.target_url));
    lines.push(format!(
        "Started: {}",
        context.started_at.format("%Y-%m-%d %H:%M:%S %Z")
    ));
    lines.push(format!("Outcome: {}", report.final_state));
    lines.push(format!("Duration: {:.2}s", report.elapsed.as_secs_f64()));
    lines.push(format!(
        "Requests: {} planned, {} dispatched, {} completed",
        context.planned_requests, stats.total_dispatched, stats.total_completed
    ));
    lines.push(format!(
        "Rate: {:.2} req/s achieved (target {} req/s)",
        report.achieved_rate(),
        context.target_rate
    ));

    for category in OutcomeCategory::ALL {
        let count = stats.counts.get(category);
        if category == OutcomeCategory::Success {
            lines.push(format!(
                "{}: {} ({:.2}%)",
                category.label(),
                count,
                stats.success_rate() * 100.0
            ));
        } else {
            lines.push(format!("{}: {}", category.label(), count));
        }
    }

    if !stats.status_counts.is_empty() {
        let codes: Vec<String> = stats
            .status_counts
            .iter()
            .map(|(status, count)| format!("{}={}", status, count))
            .collect();
        lines.push(format!("Status Codes: {}", codes.join(", ")));
    }

    let latency = &stats.latency;
    lines.push(format!(
        "Min/Mean/Max Latency: {:.2}ms / {:.2}ms / {:.2}ms",
        latency.min_ms, latency.mean_ms, latency.max_ms
    ));
    lines.push(format!(
        "P50/P90/P95/P99 Latency (approx.): {:.2}ms / {:.2}ms / {:.2}ms / {:.2}ms",
        latency.p50_ms, latency.p90_ms, latency.p95_ms, latency.p99_ms
    ));
    lines
}
