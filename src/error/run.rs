use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Run aborted after {dispatched} of {planned} requests were dispatched.")]
    Aborted { dispatched: u64, planned: u64 },
    #[error("Failed to build runtime: {source}")]
    RuntimeBuildFailed {
        #[source]
        source: std::io::Error,
    },
}
