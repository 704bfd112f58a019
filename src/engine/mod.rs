//! Open-loop load engine: dispatch schedule, admission gate and the run
//! state machine that ties them to an executor and a collector.
mod config;
mod limiter;
mod runner;
mod schedule;


pub use config::{
    DEFAULT_GRACE_PERIOD, DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_WARMUP_REQUESTS, RunConfig,
};
pub use limiter::{ConcurrencyLimiter, SlotPermit};
pub use runner::{LoadRunner, RunReport, RunState};
pub use schedule::{RateScheduler, ScheduleState, ScheduledDispatch};
