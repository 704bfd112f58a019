use clap::{Args, Subcommand};

use crate::args::PositiveU64;

use super::super::parsers::parse_positive_u64;

/// Requests per second for the `normal` profile.
pub const NORMAL_RATE: f64 = 5.0;
/// In-flight cap for the `normal` profile.
pub const NORMAL_CONCURRENCY: usize = 10;
/// Requests per second for the `heavy` profile.
pub const HEAVY_RATE: f64 = 300.0;
/// In-flight cap for the `heavy` profile.
pub const HEAVY_CONCURRENCY: usize = 1000;

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Light steady traffic (5 req/s, 10 in flight)
    Normal(PresetNormalArgs),
    /// Heavy steady traffic (300 req/s, 1000 in flight)
    Heavy(PresetHeavyArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PresetNormalArgs {
    /// Target URL for the load run
    #[arg(long, short)]
    pub url: String,

    /// Duration of the run (seconds)
    #[arg(long = "duration", short = 't', default_value = "600", value_parser = parse_positive_u64)]
    pub target_duration: PositiveU64,
}

#[derive(Debug, Args, Clone)]
pub struct PresetHeavyArgs {
    /// Target URL for the load run
    #[arg(long, short)]
    pub url: String,

    /// Duration of the run (seconds)
    #[arg(long = "duration", short = 't', default_value = "600", value_parser = parse_positive_u64)]
    pub target_duration: PositiveU64,
}
