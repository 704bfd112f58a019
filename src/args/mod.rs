//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{
    Command, HEAVY_CONCURRENCY, HEAVY_RATE, NORMAL_CONCURRENCY, NORMAL_RATE, PresetHeavyArgs,
    PresetNormalArgs, TesterArgs,
};
pub use types::{HttpMethod, OutputFormat, PositiveU64, PositiveUsize};

pub(crate) use parsers::parse_header;
