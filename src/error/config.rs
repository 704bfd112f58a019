use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Config '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Missing URL (set --url or provide in config).")]
    MissingUrl,
    #[error("Invalid target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}'. Use http or https.")]
    UnsupportedScheme { scheme: String },
    #[error("Requests per second must be a positive finite number (got {value}).")]
    InvalidRate { value: f64 },
    #[error("Duration must be positive (got {secs}s).")]
    InvalidDuration { secs: f64 },
    #[error("Max concurrency must be >= 1.")]
    InvalidConcurrency,
    #[error("Request timeout must be > 0.")]
    InvalidTimeout,
    #[error("Rate {rate}/s over {secs}s schedules no requests.")]
    EmptySchedule { rate: f64, secs: f64 },
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
