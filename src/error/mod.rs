mod app;
mod config;
mod http;
mod metrics;
mod run;
#[cfg(test)]
mod test_support;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::HttpError;
pub use metrics::{CollectorError, MetricsError};
pub use run::RunError;
pub use validation::ValidationError;
