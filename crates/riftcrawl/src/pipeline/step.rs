use std::time::{Duration, Instant};

use thiserror::Error;

use super::control::RunControl;
use super::log::{StepLog, StepLogs};
use super::pool::{self, UnitResult};
use super::sink::LogSink;

/// Why a single unit of step work did not produce an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("document store error: {0}")]
    Store(String),

    #[error("cancelled before completion")]
    Cancelled,
}

/// State every pipeline context exposes to the engine.
pub trait RunContext {
    /// Pipeline kind, used in spans and error messages.
    fn kind(&self) -> &'static str;

    fn run_id(&self) -> &str;

    fn logs(&self) -> &StepLogs;

    fn logs_mut(&mut self) -> &mut StepLogs;
}

/// One unit-of-work type in a pipeline.
///
/// `execute` reports success and failure only through the logs it appends
/// to the context. A failing unit is logged as FAILED and the step moves on
/// to the next one; it must not panic.
pub trait Step<C>: Send + Sync {
    /// Key under which this step's logs are recorded.
    fn name(&self) -> &'static str;

    fn execute(&self, ctx: &mut C, scope: &RunScope<'_>);
}

/// Everything a step needs from the run besides its context.
pub struct RunScope<'a> {
    control: &'a RunControl,
    sink: &'a dyn LogSink,
    concurrency: usize,
}

impl<'a> RunScope<'a> {
    pub fn new(control: &'a RunControl, sink: &'a dyn LogSink) -> Self {
        Self {
            control,
            sink,
            concurrency: 1,
        }
    }

    /// Maximum units in flight at once. Values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn control(&self) -> &RunControl {
        self.control
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Appends `log` to the registry and forwards it to the sink.
    pub fn record(&self, logs: &mut StepLogs, log: StepLog) {
        self.sink.record(&log);
        logs.push(log);
    }

    /// Runs `work` once per unit through the bounded pool. Results come back
    /// in the same order as `units`.
    pub fn run_units<U, T, F>(&self, units: Vec<U>, work: F) -> Vec<UnitResult<U, T>>
    where
        U: Send,
        T: Send,
        F: Fn(&U) -> Result<T, UnitError> + Sync,
    {
        pool::run_units(units, self.concurrency, self.control, work)
    }

    /// Runs a single unit on the calling thread.
    pub fn run_one<T>(&self, work: impl FnOnce() -> Result<T, UnitError>) -> (Result<T, UnitError>, Duration) {
        if self.control.is_cancelled() {
            return (Err(UnitError::Cancelled), Duration::ZERO);
        }
        timed(work)
    }
}

/// Runs `f` and measures its wall-clock duration.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}
