//! Core library for the `pacer` CLI.
//!
//! `pacer` is an open-loop HTTP load generator: it dispatches requests to one
//! target at a fixed rate on absolute deadlines, caps the number of requests
//! in flight, and aggregates every outcome into run statistics. The engine
//! pieces ([`engine::RateScheduler`], [`engine::ConcurrencyLimiter`],
//! [`engine::LoadRunner`], [`metrics::ResultCollector`] and
//! [`http::RequestExecutor`]) are usable on their own; the binary wires them
//! to the command line.
mod app;
pub mod args;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod http;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;
mod system;
