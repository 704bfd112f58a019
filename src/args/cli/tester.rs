use clap::Parser;
use std::time::Duration;

use super::super::defaults::{
    DEFAULT_CONCURRENCY_ARG, DEFAULT_GRACE_PERIOD_ARG, DEFAULT_REQUEST_TIMEOUT_ARG,
    DEFAULT_WARMUP_REQUESTS_ARG,
};
use super::super::parsers::{
    parse_bool_env, parse_duration_arg, parse_header, parse_positive_u64, parse_positive_usize,
    parse_rate,
};
use super::super::types::{HttpMethod, OutputFormat, PositiveU64, PositiveUsize};
use super::presets::Command;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Open-loop HTTP load generator - fixed-rate dispatch on absolute deadlines, bounded in-flight requests, and per-outcome latency statistics."
)]
pub struct TesterArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// HTTP method to use
    #[arg(long, short = 'X', default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// Target URL for the load run
    #[arg(long, short)]
    pub url: Option<String>,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body data (for POST/PUT)
    #[arg(long, short, default_value = "")]
    pub data: String,

    /// Target requests per second (fractional values allowed, e.g. 0.5)
    #[arg(long = "rate", short = 'q', default_value = "10", value_parser = parse_rate)]
    pub rate: f64,

    /// Duration of the run (seconds)
    #[arg(
        long = "duration",
        short = 't',
        default_value = "30",
        value_parser = parse_positive_u64
    )]
    pub target_duration: PositiveU64,

    /// Max number of requests in flight at once
    #[arg(
        long = "concurrency",
        short = 'c',
        alias = "max-tasks",
        default_value = DEFAULT_CONCURRENCY_ARG,
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// Expected HTTP status code (any 2xx counts as success when unset)
    #[arg(long = "status", short = 's')]
    pub expected_status_code: Option<u16>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        default_value = DEFAULT_REQUEST_TIMEOUT_ARG,
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// Timeout for establishing a new connection (supports ms/s/m/h)
    #[arg(
        long = "connect-timeout",
        default_value = "5s",
        value_parser = parse_duration_arg
    )]
    pub connect_timeout: Duration,

    /// Upper bound of the random delay added to each dispatch (supports ms/s/m/h)
    #[arg(long = "jitter", value_parser = parse_duration_arg)]
    pub jitter: Option<Duration>,

    /// Requests sent before the schedule starts; not counted in statistics
    #[arg(long = "warmup-requests", default_value = DEFAULT_WARMUP_REQUESTS_ARG)]
    pub warmup_requests: u32,

    /// Pause between warm-up and the first scheduled request (supports ms/s/m/h)
    #[arg(long = "warmup-delay", value_parser = parse_duration_arg)]
    pub warmup_delay: Option<Duration>,

    /// Time in-flight requests get to finish after an abort (supports ms/s/m/h)
    #[arg(
        long = "grace-period",
        default_value = DEFAULT_GRACE_PERIOD_ARG,
        value_parser = parse_duration_arg
    )]
    pub grace_period: Duration,

    /// Abort the run once this much wall time has passed (supports ms/s/m/h)
    #[arg(long = "deadline", value_parser = parse_duration_arg)]
    pub deadline: Option<Duration>,

    /// Skip TLS certificate and hostname verification
    #[arg(long = "insecure", short = 'k')]
    pub insecure: bool,

    /// Summary format
    #[arg(long = "output-format", default_value = "text", value_enum)]
    pub output_format: OutputFormat,

    /// Disable the live progress line
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by PACER_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Path to config file (TOML/JSON). Defaults to ./pacer.toml or ./pacer.json if present.
    #[arg(long)]
    pub config: Option<String>,
}
