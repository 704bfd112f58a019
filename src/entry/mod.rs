use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::{
    Command, HEAVY_CONCURRENCY, HEAVY_RATE, NORMAL_CONCURRENCY, NORMAL_RATE, PositiveUsize,
    TesterArgs,
};
use crate::config::{DEFAULT_CONFIG_FILES, apply_config, load_config};
use crate::error::{AppError, AppResult, RunError};

/// Process entry point used by the `pacer` binary.
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration, when the runtime
/// cannot be built, and when the run was aborted.
pub fn run() -> AppResult<()> {
    let (mut args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    crate::system::logger::init_logging(args.verbose, args.no_color);

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }
    apply_preset(&mut args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::run(RunError::RuntimeBuildFailed { source: err }))?;

    runtime.block_on(crate::app::run_local(args))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = TesterArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

/// Preset subcommands replace target, rate, concurrency and duration.
fn apply_preset(args: &mut TesterArgs) -> AppResult<()> {
    let Some(command) = args.command.take() else {
        return Ok(());
    };
    let (url, duration, rate, concurrency) = match command {
        Command::Normal(preset) => (
            preset.url,
            preset.target_duration,
            NORMAL_RATE,
            NORMAL_CONCURRENCY,
        ),
        Command::Heavy(preset) => (
            preset.url,
            preset.target_duration,
            HEAVY_RATE,
            HEAVY_CONCURRENCY,
        ),
    };
    args.url = Some(url);
    args.target_duration = duration;
    args.rate = rate;
    args.concurrency = PositiveUsize::try_from(concurrency)?;
    Ok(())
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}
