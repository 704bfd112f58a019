use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CollectorError {
    #[error("Result collector is already finalized.")]
    AlreadyFinalized,
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Collector error: {0}")]
    Collector(#[from] CollectorError),
}
