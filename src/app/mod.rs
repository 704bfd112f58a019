mod progress;
mod runner;
pub(crate) mod summary;

pub(crate) use runner::run_local;
