use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveU64, PositiveUsize, TesterArgs, parse_header};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// A config value is used only where the argument did not come from the
/// command line.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(parse_header(header).map_err(|err| {
                AppError::config(ConfigError::InvalidField {
                    field: "headers",
                    reason: err.to_string(),
                })
            })?);
        }
        args.headers = parsed;
    }

    if !is_cli(matches, "data")
        && let Some(data) = config.data.clone()
    {
        args.data = data;
    }

    if !is_cli(matches, "rate")
        && let Some(rate) = config.rate
    {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(AppError::config(ConfigError::InvalidRate { value: rate }));
        }
        args.rate = rate;
    }

    if !is_cli(matches, "target_duration")
        && let Some(duration) = config.duration
    {
        args.target_duration = PositiveU64::try_from(duration).map_err(|err| {
            AppError::config(ConfigError::InvalidField {
                field: "duration",
                reason: err.to_string(),
            })
        })?;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = PositiveUsize::try_from(concurrency)
            .map_err(|_err| AppError::config(ConfigError::InvalidConcurrency))?;
    }

    if !is_cli(matches, "expected_status_code")
        && let Some(status) = config.status
    {
        args.expected_status_code = Some(status);
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration("timeout")?;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = timeout.to_duration("connect_timeout")?;
    }

    if !is_cli(matches, "jitter")
        && let Some(jitter) = config.jitter.as_ref()
    {
        args.jitter = Some(jitter.to_duration("jitter")?);
    }

    if !is_cli(matches, "warmup_requests")
        && let Some(requests) = config.warmup_requests
    {
        args.warmup_requests = requests;
    }

    if !is_cli(matches, "warmup_delay")
        && let Some(delay) = config.warmup_delay.as_ref()
    {
        args.warmup_delay = Some(delay.to_duration("warmup_delay")?);
    }

    if !is_cli(matches, "grace_period")
        && let Some(grace) = config.grace_period.as_ref()
    {
        args.grace_period = grace.to_duration("grace_period")?;
    }

    if !is_cli(matches, "deadline")
        && let Some(deadline) = config.deadline.as_ref()
    {
        args.deadline = Some(deadline.to_duration("deadline")?);
    }

    if !is_cli(matches, "insecure")
        && let Some(insecure) = config.insecure
    {
        args.insecure = insecure;
    }

    if !is_cli(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    if !is_cli(matches, "no_progress")
        && let Some(no_progress) = config.no_progress
    {
        args.no_progress = no_progress;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}
