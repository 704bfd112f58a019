use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Upper bound applied when no concurrency limit is given.
pub const DEFAULT_MAX_CONCURRENCY: usize = 500;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_WARMUP_REQUESTS: u32 = 1;

/// Validated, immutable parameters of one load run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    target_url: Url,
    requests_per_second: f64,
    duration: Duration,
    max_concurrency: usize,
    request_timeout: Duration,
    total_requests: u64,
    jitter: Option<Duration>,
    warmup_requests: u32,
    warmup_delay: Duration,
    grace_period: Duration,
    deadline: Option<Duration>,
    expected_status: Option<u16>,
}

impl RunConfig {
    /// Validate the core run parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the URL does not parse or is not
    /// http(s), the rate or duration is not a positive finite number, the
    /// concurrency is zero, the timeout is zero, or the schedule rounds to
    /// zero requests.
    pub fn new(
        target_url: &str,
        requests_per_second: f64,
        duration_secs: f64,
        max_concurrency: usize,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let target_url = parse_target_url(target_url)?;
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRate {
                value: requests_per_second,
            });
        }
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ConfigError::InvalidDuration {
                secs: duration_secs,
            });
        }
        let duration = Duration::try_from_secs_f64(duration_secs).map_err(|_err| {
            ConfigError::InvalidDuration {
                secs: duration_secs,
            }
        })?;
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        let total_requests = planned_requests(requests_per_second, duration_secs);
        if total_requests == 0 {
            return Err(ConfigError::EmptySchedule {
                rate: requests_per_second,
                secs: duration_secs,
            });
        }

        Ok(Self {
            target_url,
            requests_per_second,
            duration,
            max_concurrency,
            request_timeout,
            total_requests,
            jitter: None,
            warmup_requests: DEFAULT_WARMUP_REQUESTS,
            warmup_delay: Duration::ZERO,
            grace_period: DEFAULT_GRACE_PERIOD,
            deadline: None,
            expected_status: None,
        })
    }

    /// Random extra delay in `[0, jitter)` added to each dispatch.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Option<Duration>) -> Self {
        self.jitter = jitter.filter(|value| !value.is_zero());
        self
    }

    /// Requests sent before the schedule starts, and the pause after them.
    #[must_use]
    pub const fn with_warmup(mut self, requests: u32, delay: Duration) -> Self {
        self.warmup_requests = requests;
        self.warmup_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Abort the run once this much wall time has passed since it started.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Treat only this status as success instead of any 2xx.
    #[must_use]
    pub const fn with_expected_status(mut self, expected_status: Option<u16>) -> Self {
        self.expected_status = expected_status;
        self
    }

    #[must_use]
    pub const fn target_url(&self) -> &Url {
        &self.target_url
    }

    #[must_use]
    pub const fn requests_per_second(&self) -> f64 {
        self.requests_per_second
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// `round(rate * duration)`.
    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }

    #[must_use]
    pub const fn jitter(&self) -> Option<Duration> {
        self.jitter
    }

    #[must_use]
    pub const fn warmup_requests(&self) -> u32 {
        self.warmup_requests
    }

    #[must_use]
    pub const fn warmup_delay(&self) -> Duration {
        self.warmup_delay
    }

    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        self.grace_period
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    #[must_use]
    pub const fn expected_status(&self) -> Option<u16> {
        self.expected_status
    }
}

fn parse_target_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidUrl {
        url: raw.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            scheme: other.to_owned(),
        }),
    }
}

fn planned_requests(requests_per_second: f64, duration_secs: f64) -> u64 {
    let planned = (requests_per_second * duration_secs).round();
    if planned >= u64::MAX as f64 {
        u64::MAX
    } else {
        planned as u64
    }
}
