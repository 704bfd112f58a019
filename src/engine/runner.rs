use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Url;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::http::RequestExecutor;
use crate::metrics::{OutcomeCategory, RequestOutcome, ResultCollector, RunStatistics};
use crate::shutdown::{ShutdownReceiver, ShutdownSender};
use crate::shutdown_handlers::spawn_deadline_timer;

use super::{ConcurrencyLimiter, RateScheduler, RunConfig};

/// Lifecycle of a single run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Warming,
    Running,
    Draining,
    Completed,
    Aborted,
}

impl RunState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Warming => "warming",
            RunState::Running => "running",
            RunState::Draining => "draining",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`LoadRunner::run`] hands back once the run has ended.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub final_state: RunState,
    pub statistics: RunStatistics,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl RunReport {
    #[must_use]
    pub const fn aborted(&self) -> bool {
        matches!(self.final_state, RunState::Aborted)
    }

    /// Completed requests per second of wall time.
    #[must_use]
    pub const fn achieved_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.statistics.total_completed as f64 / secs
    }
}

fn serialize_millis<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

/// Drives one run from `Idle` to `Completed` or `Aborted`.
///
/// The runner owns its config, limiter and collector, so several runs can
/// coexist in one process. The collector and state channel can be cloned out
/// before [`LoadRunner::run`] consumes the runner, which is how the progress
/// display observes a run.
pub struct LoadRunner<E> {
    config: RunConfig,
    executor: Arc<E>,
    limiter: ConcurrencyLimiter,
    collector: Arc<ResultCollector>,
    state_tx: watch::Sender<RunState>,
}

impl<E> LoadRunner<E>
where
    E: RequestExecutor + 'static,
{
    #[must_use]
    pub fn new(config: RunConfig, executor: Arc<E>) -> Self {
        let limiter = ConcurrencyLimiter::new(config.max_concurrency());
        let (state_tx, _) = watch::channel(RunState::Idle);
        Self {
            config,
            executor,
            limiter,
            collector: Arc::new(ResultCollector::new()),
            state_tx,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    #[must_use]
    pub fn collector(&self) -> Arc<ResultCollector> {
        Arc::clone(&self.collector)
    }

    #[must_use]
    pub fn state_rx(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state_tx.borrow()
    }

    /// Execute the run to its end.
    ///
    /// A message on `shutdown_tx` (signal handler, caller, or the configured
    /// deadline) moves the run to `Aborted` from whichever state it is in.
    /// Per-request failures never end the run early.
    pub async fn run(self, shutdown_tx: &ShutdownSender) -> RunReport {
        let shutdown_rx = shutdown_tx.subscribe();
        self.run_with_shutdown(shutdown_tx, shutdown_rx).await
    }

    /// Same as [`Self::run`], observing a receiver the caller subscribed
    /// earlier. A shutdown sent between that subscription and the start of
    /// the run aborts it immediately.
    pub async fn run_with_shutdown(
        self,
        shutdown_tx: &ShutdownSender,
        mut shutdown_rx: ShutdownReceiver,
    ) -> RunReport {
        let started = Instant::now();
        let deadline_timer = self
            .config
            .deadline()
            .map(|deadline| spawn_deadline_timer(deadline, shutdown_tx.clone()));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut in_flight = JoinSet::new();

        let finished = self.warm_up(&mut shutdown_rx).await
            && self
                .dispatch_all(&mut shutdown_rx, &mut in_flight, &cancel_rx)
                .await
            && self.drain(&mut shutdown_rx, &mut in_flight).await;

        if !finished {
            self.set_state(RunState::Aborted);
            self.abort_in_flight(&mut in_flight, &cancel_tx).await;
        }
        if let Some(timer) = deadline_timer {
            timer.abort();
        }

        let statistics = self.collector.finalize();
        let final_state = if finished {
            RunState::Completed
        } else {
            RunState::Aborted
        };
        self.set_state(final_state);
        RunReport {
            final_state,
            statistics,
            elapsed: started.elapsed(),
        }
    }

    fn set_state(&self, next: RunState) {
        let previous = *self.state_tx.borrow();
        if previous == next {
            return;
        }
        debug!("Run state {} -> {}", previous, next);
        self.state_tx.send_modify(|state| *state = next);
    }

    async fn warm_up(&self, shutdown_rx: &mut ShutdownReceiver) -> bool {
        let requests = self.config.warmup_requests();
        let delay = self.config.warmup_delay();
        if requests == 0 && delay.is_zero() {
            return true;
        }
        self.set_state(RunState::Warming);

        let url = self.config.target_url();
        for attempt in 1..=requests {
            let outcome = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => return false,
                outcome = guarded_execute(self.executor.as_ref(), url, self.config.request_timeout()) => outcome,
            };
            match outcome.category() {
                OutcomeCategory::Success => debug!(
                    "Warm-up request {}/{} succeeded in {:.2}ms",
                    attempt,
                    requests,
                    outcome.latency_millis()
                ),
                OutcomeCategory::HttpError
                | OutcomeCategory::NetworkError
                | OutcomeCategory::Timeout
                | OutcomeCategory::Cancelled => warn!(
                    "Warm-up request {}/{} failed ({}): {}",
                    attempt,
                    requests,
                    outcome.category().as_str(),
                    outcome.error_detail().unwrap_or("no detail")
                ),
            }
        }

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => return false,
                () = tokio::time::sleep(delay) => {}
            }
        }
        true
    }

    async fn dispatch_all(
        &self,
        shutdown_rx: &mut ShutdownReceiver,
        in_flight: &mut JoinSet<()>,
        cancel_rx: &watch::Receiver<bool>,
    ) -> bool {
        self.set_state(RunState::Running);
        let mut scheduler = RateScheduler::from_config(&self.config, Instant::now());
        let mut rng = StdRng::from_entropy();
        info!(
            "Dispatching {} requests to {} at {}/s (max {} in flight)",
            scheduler.total_requests(),
            self.config.target_url(),
            self.config.requests_per_second(),
            self.limiter.capacity()
        );

        while let Some(dispatch) = scheduler.next_dispatch_jittered(&mut rng) {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => return false,
                () = tokio::time::sleep_until(dispatch.due) => {}
            }
            let Some(permit) = self.limiter.acquire(shutdown_rx).await else {
                return false;
            };
            if let Err(err) = self.collector.note_dispatched() {
                error!("Dispatch {} not counted: {}", dispatch.index, err);
                return false;
            }

            let executor = Arc::clone(&self.executor);
            let collector = Arc::clone(&self.collector);
            let url = self.config.target_url().clone();
            let timeout = self.config.request_timeout();
            let mut cancel_rx = cancel_rx.clone();
            in_flight.spawn(async move {
                let dispatch_time = Instant::now();
                let outcome = tokio::select! {
                    outcome = guarded_execute(executor.as_ref(), &url, timeout) => outcome,
                    () = wait_for_cancel(&mut cancel_rx) => RequestOutcome::failure(
                        dispatch_time,
                        Instant::now(),
                        OutcomeCategory::Cancelled,
                        "cancelled after grace period",
                    ),
                };
                drop(permit);
                if let Err(err) = collector.record(&outcome) {
                    warn!("Outcome dropped: {}", err);
                }
            });

            while let Some(joined) = in_flight.try_join_next() {
                log_join_error(joined);
            }
        }
        true
    }

    async fn drain(&self, shutdown_rx: &mut ShutdownReceiver, in_flight: &mut JoinSet<()>) -> bool {
        self.set_state(RunState::Draining);
        debug!("Waiting for {} in-flight requests", in_flight.len());
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => return false,
                joined = in_flight.join_next() => match joined {
                    Some(joined) => log_join_error(joined),
                    None => return true,
                },
            }
        }
    }

    async fn abort_in_flight(&self, in_flight: &mut JoinSet<()>, cancel_tx: &watch::Sender<bool>) {
        if in_flight.is_empty() {
            return;
        }
        let grace_period = self.config.grace_period();
        info!(
            "Run aborted, waiting up to {:?} for {} in-flight requests",
            grace_period,
            in_flight.len()
        );
        let settled = tokio::time::timeout(grace_period, async {
            while let Some(joined) = in_flight.join_next().await {
                log_join_error(joined);
            }
        })
        .await;
        if settled.is_ok() {
            return;
        }

        warn!(
            "Grace period elapsed, cancelling {} in-flight requests",
            in_flight.len()
        );
        if cancel_tx.send(true).is_err() {
            debug!("No in-flight request is listening for cancellation");
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join_error(joined);
        }
    }
}

/// Runs the executor, turning a panic into a `NetworkError` outcome.
async fn guarded_execute<E>(executor: &E, url: &Url, timeout: Duration) -> RequestOutcome
where
    E: RequestExecutor + ?Sized,
{
    let dispatch_time = Instant::now();
    match AssertUnwindSafe(executor.execute(url, timeout))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(_panic) => {
            error!("Request executor panicked for {}", url);
            RequestOutcome::failure(
                dispatch_time,
                Instant::now(),
                OutcomeCategory::NetworkError,
                "executor panicked",
            )
        }
    }
}

async fn wait_for_cancel(cancel_rx: &mut watch::Receiver<bool>) {
    if cancel_rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        error!("Request task failed: {}", err);
    }
}
