use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use super::RunConfig;

/// Position of the scheduler within its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    /// Nominal due time of the next dispatch, `None` once the plan is spent.
    pub next_dispatch_time: Option<Instant>,
    pub requests_dispatched_so_far: u64,
}

/// One slot handed out by [`RateScheduler::next_dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledDispatch {
    pub index: u64,
    pub due: Instant,
}

/// Absolute-deadline dispatch plan: `t_i = start + i / rate` for
/// `i in 0..total_requests`.
///
/// Due times are derived from the start instant, never accumulated, so a slow
/// caller does not shift later slots. A caller that falls behind simply gets
/// due times in the past. The scheduler itself never waits.
#[derive(Debug, Clone)]
pub struct RateScheduler {
    start: Instant,
    requests_per_second: f64,
    total_requests: u64,
    max_jitter: Option<Duration>,
    state: ScheduleState,
}

impl RateScheduler {
    #[must_use]
    pub fn new(start: Instant, requests_per_second: f64, total_requests: u64) -> Self {
        let mut scheduler = Self {
            start,
            requests_per_second,
            total_requests,
            max_jitter: None,
            state: ScheduleState {
                next_dispatch_time: None,
                requests_dispatched_so_far: 0,
            },
        };
        scheduler.state.next_dispatch_time = scheduler.due_time(0);
        scheduler
    }

    #[must_use]
    pub fn from_config(config: &RunConfig, start: Instant) -> Self {
        Self::new(
            start,
            config.requests_per_second(),
            config.total_requests(),
        )
        .with_jitter(config.jitter())
    }

    #[must_use]
    pub fn with_jitter(mut self, max_jitter: Option<Duration>) -> Self {
        self.max_jitter = max_jitter.filter(|value| !value.is_zero());
        self
    }

    /// Nominal due time of slot `index`, or `None` past the end of the plan.
    #[must_use]
    pub fn due_time(&self, index: u64) -> Option<Instant> {
        if index >= self.total_requests {
            return None;
        }
        let offset_secs = index as f64 / self.requests_per_second;
        let offset = Duration::try_from_secs_f64(offset_secs).ok()?;
        self.start.checked_add(offset)
    }

    /// Hand out the next slot at its nominal due time.
    pub fn next_dispatch(&mut self) -> Option<ScheduledDispatch> {
        let index = self.state.requests_dispatched_so_far;
        let due = self.due_time(index)?;
        self.advance(index);
        Some(ScheduledDispatch { index, due })
    }

    /// Hand out the next slot, delayed by a random offset in `[0, max_jitter)`.
    pub fn next_dispatch_jittered<R>(&mut self, rng: &mut R) -> Option<ScheduledDispatch>
    where
        R: Rng + ?Sized,
    {
        let mut dispatch = self.next_dispatch()?;
        if let Some(max_jitter) = self.max_jitter {
            let offset = rng.gen_range(Duration::ZERO..max_jitter);
            dispatch.due = dispatch.due.checked_add(offset).unwrap_or(dispatch.due);
        }
        Some(dispatch)
    }

    fn advance(&mut self, index: u64) {
        let next = index.saturating_add(1);
        self.state = ScheduleState {
            next_dispatch_time: self.due_time(next),
            requests_dispatched_so_far: next,
        };
    }

    #[must_use]
    pub const fn state(&self) -> ScheduleState {
        self.state
    }

    #[must_use]
    pub const fn start(&self) -> Instant {
        self.start
    }

    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }

    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.total_requests
            .saturating_sub(self.state.requests_dispatched_so_far)
    }

    /// Interval between consecutive nominal due times.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.requests_per_second).unwrap_or(Duration::MAX)
    }
}
