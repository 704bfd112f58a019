//! Single-request execution against the target URL.
mod client;
mod executor;


pub use client::{ClientSettings, RequestTemplate, build_client};
pub use executor::{HttpExecutor, RequestExecutor, classify_status};
