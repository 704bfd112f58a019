use super::*;
use crate::args::parsers::{parse_bool_env, parse_duration_arg, parse_rate};

#[test]
fn parse_duration_units() -> AppResult<()> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("7", Duration::from_secs(7)),
        ("7s", Duration::from_secs(7)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3600)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_arg(input)?;
        if parsed != expected {
            return Err(AppError::validation(format!(
                "'{}' parsed to {:?}, expected {:?}",
                input, parsed, expected
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_rejects_bad_input() -> AppResult<()> {
    for input in ["", "ms", "0s", "10d", "1.5s"] {
        if parse_duration_arg(input).is_ok() {
            return Err(AppError::validation(format!(
                "Expected '{}' to be rejected",
                input
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_rate_accepts_positive_floats() -> AppResult<()> {
    let rate = parse_rate(" 12.5 ")?;
    if (rate - 12.5).abs() > f64::EPSILON {
        return Err(AppError::validation(format!("Unexpected rate: {}", rate)));
    }
    Ok(())
}

#[test]
fn parse_bool_env_values() -> AppResult<()> {
    if !parse_bool_env("Yes")? || parse_bool_env("off")? {
        return Err(AppError::validation("Unexpected boolean parse"));
    }
    if parse_bool_env("maybe").is_ok() {
        return Err(AppError::validation("Expected invalid boolean to fail"));
    }
    Ok(())
}
