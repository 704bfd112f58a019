use super::*;

#[test]
fn parse_args_normal_subcommand() -> AppResult<()> {
    let args = TesterArgs::try_parse_from(["pacer", "normal", "--url", "http://localhost"])?;
    match args.command {
        Some(Command::Normal(preset)) => {
            if preset.url != "http://localhost" {
                return Err(AppError::validation("Unexpected normal url"));
            }
            if preset.target_duration.get() != 600 {
                return Err(AppError::validation("Unexpected normal duration"));
            }
            Ok(())
        }
        _ => Err(AppError::validation("Expected normal subcommand")),
    }
}

#[test]
fn parse_args_heavy_subcommand() -> AppResult<()> {
    let args = TesterArgs::try_parse_from([
        "pacer",
        "heavy",
        "--url",
        "http://localhost",
        "--duration",
        "20",
    ])?;
    match args.command {
        Some(Command::Heavy(preset)) => {
            if preset.target_duration.get() != 20 {
                return Err(AppError::validation("Unexpected heavy duration"));
            }
            Ok(())
        }
        _ => Err(AppError::validation("Expected heavy subcommand")),
    }
}
