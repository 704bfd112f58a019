use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration_arg;
use crate::args::{HttpMethod, OutputFormat};
use crate::error::{AppError, AppResult, ConfigError};

/// Contents of `pacer.toml` / `pacer.json`. Every field is optional and only
/// fills in what the command line left at its default.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub headers: Option<Vec<String>>,
    pub data: Option<String>,
    pub rate: Option<f64>,
    pub duration: Option<u64>,
    pub concurrency: Option<usize>,
    pub status: Option<u16>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub jitter: Option<DurationValue>,
    pub warmup_requests: Option<u32>,
    pub warmup_delay: Option<DurationValue>,
    pub grace_period: Option<DurationValue>,
    pub deadline: Option<DurationValue>,
    pub insecure: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub no_progress: Option<bool>,
}

/// Either a bare number of seconds or a string with a `ms`/`s`/`m`/`h` unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> AppResult<Duration> {
        match self {
            DurationValue::Seconds(0) => Err(AppError::config(ConfigError::InvalidField {
                field,
                reason: "duration must be > 0".to_owned(),
            })),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_arg(text).map_err(|err| {
                AppError::config(ConfigError::InvalidField {
                    field,
                    reason: err.to_string(),
                })
            }),
        }
    }
}
