use super::*;
use crate::engine;
use crate::error::{AppError, AppResult};
use clap::Parser;
use std::time::Duration;

mod headers;
mod parsers;
mod subcommands;
