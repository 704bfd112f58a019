use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

use crate::engine::RunState;
use crate::metrics::ResultCollector;

/// Redraw interval for the interactive progress line.
const TTY_REFRESH: Duration = Duration::from_millis(250);
/// Log interval when stderr is not a terminal.
const LOG_REFRESH: Duration = Duration::from_secs(1);
/// Width of the bar in cells.
const BAR_WIDTH: usize = 30;

/// Point-in-time view of a run, as shown on the progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProgressSnapshot {
    pub(crate) state: RunState,
    pub(crate) dispatched: u64,
    pub(crate) planned: u64,
    pub(crate) completed: u64,
    pub(crate) in_flight: u64,
    pub(crate) elapsed_ms: u128,
}

/// Follow a run until it reaches a terminal state.
///
/// On a terminal the line is redrawn in place on stderr; otherwise a
/// progress record is logged once per second while requests are being
/// dispatched or drained.
pub(crate) fn setup_progress_indicator(
    mut state_rx: watch::Receiver<RunState>,
    collector: Arc<ResultCollector>,
    planned: u64,
    no_color: bool,
) -> tokio::task::JoinHandle<()> {
    let style = ProgressStyle::new(BAR_WIDTH);
    let interactive = std::io::stderr().is_terminal();
    let run_start = Instant::now();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(if interactive { TTY_REFRESH } else { LOG_REFRESH });
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = state_rx.changed() => {
                    let state = *state_rx.borrow_and_update();
                    if changed.is_err() || state.is_terminal() {
                        if interactive {
                            let snapshot = take_snapshot(state, &collector, planned, run_start);
                            if render_progress_line(&style, &snapshot, no_color).is_ok() {
                                drop(finish_progress_line());
                            }
                        }
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let state = *state_rx.borrow();
                    let snapshot = take_snapshot(state, &collector, planned, run_start);
                    if interactive {
                        if render_progress_line(&style, &snapshot, no_color).is_err() {
                            break;
                        }
                    } else if matches!(state, RunState::Running | RunState::Draining) {
                        info!(
                            "{}: {}/{} dispatched, {} completed, {} in flight",
                            state, snapshot.dispatched, snapshot.planned, snapshot.completed, snapshot.in_flight
                        );
                    }
                }
            }
        }
    })
}

fn take_snapshot(
    state: RunState,
    collector: &ResultCollector,
    planned: u64,
    run_start: Instant,
) -> ProgressSnapshot {
    let stats = collector.snapshot();
    ProgressSnapshot {
        state,
        dispatched: stats.total_dispatched,
        planned,
        completed: stats.total_completed,
        in_flight: stats.in_flight(),
        elapsed_ms: run_start.elapsed().as_millis(),
    }
}

fn render_progress_line(
    style: &ProgressStyle,
    snapshot: &ProgressSnapshot,
    no_color: bool,
) -> Result<(), std::io::Error> {
    let line = build_progress_line(style, snapshot, no_color);

    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for segment in line {
        if let Some(color) = segment.color {
            queue!(
                out,
                SetForegroundColor(color),
                Print(&segment.text),
                ResetColor
            )?;
        } else {
            queue!(out, Print(&segment.text))?;
        }
    }
    out.flush()?;
    Ok(())
}

fn finish_progress_line() -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn build_progress_line(
    style: &ProgressStyle,
    snapshot: &ProgressSnapshot,
    no_color: bool,
) -> Vec<ProgressSegment> {
    let size = style.size.max(1);
    let goal = u128::from(snapshot.planned.max(1));
    let current = u128::from(snapshot.dispatched).min(goal);
    let size_u128 = u128::from(u64::try_from(size).unwrap_or(u64::MAX));

    let scaled = current
        .saturating_mul(size_u128)
        .checked_div(goal)
        .unwrap_or(0);
    let complete_size = usize::try_from(scaled).unwrap_or(size).min(size);
    let incomplete_size = size.saturating_sub(complete_size);

    let progress_bar = format!(
        "{}{}{}{}",
        style.begin,
        style.fill.repeat(complete_size),
        style.empty.repeat(incomplete_size),
        style.end
    );
    let counts_text = format!(
        " {}/{} dispatched | {} completed | {} in flight",
        snapshot.dispatched, snapshot.planned, snapshot.completed, snapshot.in_flight
    );

    let elapsed_tenths = snapshot.elapsed_ms.checked_div(100).unwrap_or(0);
    let secs = elapsed_tenths.checked_div(10).unwrap_or(0);
    let tenths = elapsed_tenths.checked_rem(10).unwrap_or(0);
    let time_text = format!(" | {}.{}s | {}", secs, tenths, snapshot.state);

    if no_color {
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::plain(counts_text),
            ProgressSegment::plain(time_text),
        ]
    } else {
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::colored(counts_text, Color::Cyan),
            ProgressSegment::colored(time_text, Color::Yellow),
        ]
    }
}

struct ProgressStyle {
    size: usize,
    begin: String,
    end: String,
    fill: String,
    empty: String,
}

impl ProgressStyle {
    fn new(size: usize) -> Self {
        Self {
            size,
            begin: "[".to_owned(),
            end: "]".to_owned(),
            fill: "#".to_owned(),
            empty: "-".to_owned(),
        }
    }
}

struct ProgressSegment {
    text: String,
    color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(dispatched: u64, planned: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            state: RunState::Running,
            dispatched,
            planned,
            completed: dispatched.saturating_sub(3),
            in_flight: 3.min(dispatched),
            elapsed_ms: 2_345,
        }
    }

    fn joined(segments: &[ProgressSegment]) -> String {
        segments.iter().map(|segment| segment.text.as_str()).collect()
    }

    #[test]
    fn progress_line_scales_bar_to_dispatched() -> Result<(), String> {
        let style = ProgressStyle::new(10);
        let line = joined(&build_progress_line(&style, &snapshot(40, 100), true));
        if !line.starts_with("[####------]") {
            return Err(format!("Unexpected bar: {}", line));
        }
        if !line.contains("40/100 dispatched | 37 completed | 3 in flight") {
            return Err(format!("Unexpected counts: {}", line));
        }
        if !line.contains("2.3s | running") {
            return Err(format!("Unexpected elapsed: {}", line));
        }
        Ok(())
    }

    #[test]
    fn progress_line_clamps_overshoot() -> Result<(), String> {
        let style = ProgressStyle::new(4);
        let line = joined(&build_progress_line(&style, &snapshot(9, 3), true));
        if !line.starts_with("[####]") {
            return Err(format!("Unexpected bar: {}", line));
        }
        Ok(())
    }

    #[test]
    fn colored_line_keeps_plain_bar() -> Result<(), String> {
        let style = ProgressStyle::new(4);
        let segments = build_progress_line(&style, &snapshot(0, 10), false);
        match segments.first() {
            Some(bar) if bar.color.is_none() && bar.text == "[----]" => Ok(()),
            Some(bar) => Err(format!("Unexpected bar segment: {}", bar.text)),
            None => Err("Missing bar segment".to_owned()),
        }
    }
}
