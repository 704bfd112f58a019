use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::info;

use crate::args::TesterArgs;
use crate::engine::{LoadRunner, RunConfig};
use crate::error::{AppError, AppResult, ConfigError, RunError};
use crate::http::{ClientSettings, HttpExecutor, RequestTemplate, build_client};
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

use super::progress::setup_progress_indicator;
use super::summary::{SummaryContext, print_report};

/// Run one load test as described by `args` and print its summary.
///
/// # Errors
///
/// Returns an error when the configuration is invalid (before any request is
/// sent), when the HTTP client cannot be built, or after the summary when the
/// run was aborted.
pub(crate) async fn run_local(args: TesterArgs) -> AppResult<()> {
    let config = build_run_config(&args)?;
    let template = RequestTemplate::new(args.method, &args.headers, &args.data)?;
    let client = build_client(&ClientSettings {
        connect_timeout: args.connect_timeout,
        max_idle_per_host: config.max_concurrency(),
        insecure: args.insecure,
    })?;
    let context = SummaryContext {
        method: template.method().to_string(),
        target_url: config.target_url().clone(),
        target_rate: config.requests_per_second(),
        planned_requests: config.total_requests(),
        started_at: Local::now(),
    };
    let executor = Arc::new(HttpExecutor::new(
        client,
        template,
        config.expected_status(),
    ));

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let runner = LoadRunner::new(config, executor);
    let progress_handle = if args.no_progress {
        None
    } else {
        Some(setup_progress_indicator(
            runner.state_rx(),
            runner.collector(),
            context.planned_requests,
            args.no_color,
        ))
    };

    let report = runner.run_with_shutdown(&shutdown_tx, shutdown_rx).await;
    signal_handle.abort();
    if let Some(handle) = progress_handle {
        handle.await?;
    }
    info!(
        "Run {} after {:.2}s",
        report.final_state,
        report.elapsed.as_secs_f64()
    );

    print_report(&report, &context, args.output_format)?;

    if report.aborted() {
        return Err(AppError::run(RunError::Aborted {
            dispatched: report.statistics.total_dispatched,
            planned: context.planned_requests,
        }));
    }
    Ok(())
}

/// Validate CLI values into a [`RunConfig`].
///
/// # Errors
///
/// Returns a [`ConfigError`] for a missing or invalid URL and for any
/// rejected rate, duration, concurrency or timeout.
pub(crate) fn build_run_config(args: &TesterArgs) -> Result<RunConfig, ConfigError> {
    let url = args.url.as_deref().ok_or(ConfigError::MissingUrl)?;
    let duration_secs = args.target_duration.get() as f64;
    let config = RunConfig::new(
        url,
        args.rate,
        duration_secs,
        args.concurrency.get(),
        args.request_timeout,
    )?
    .with_jitter(args.jitter)
    .with_warmup(
        args.warmup_requests,
        args.warmup_delay.unwrap_or(Duration::ZERO),
    )
    .with_grace_period(args.grace_period)
    .with_deadline(args.deadline)
    .with_expected_status(args.expected_status_code);
    Ok(config)
}
