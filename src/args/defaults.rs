//! Default values as clap sees them. They mirror the `engine` constants.

pub(crate) const DEFAULT_CONCURRENCY_ARG: &str = "500";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_ARG: &str = "30s";
pub(crate) const DEFAULT_GRACE_PERIOD_ARG: &str = "5s";
pub(crate) const DEFAULT_WARMUP_REQUESTS_ARG: &str = "1";
