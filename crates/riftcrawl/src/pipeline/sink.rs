use std::sync::Mutex;

use tracing::{info, warn};

use super::log::{StepLog, StepStatus};

/// Receives every StepLog as it is recorded, alongside the context's own
/// registry. Passed explicitly to steps through the run scope.
pub trait LogSink: Send + Sync {
    fn record(&self, log: &StepLog);
}

/// Emits each log as a `tracing` event under the `riftcrawl::steps` target.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, log: &StepLog) {
        match log.status {
            StepStatus::Successful => info!(
                target: "riftcrawl::steps",
                step = %log.step_name,
                status = %log.status,
                execution_time_ms = log.execution_time_ms,
                "{}",
                log.message
            ),
            StepStatus::Failed => warn!(
                target: "riftcrawl::steps",
                step = %log.step_name,
                status = %log.status,
                execution_time_ms = log.execution_time_ms,
                "{}",
                log.message
            ),
        }
    }
}

/// No-op sink for unit tests.
pub struct NoopSink;

impl LogSink for NoopSink {
    fn record(&self, _log: &StepLog) {}
}

/// Keeps a copy of every log it sees.
#[derive(Default)]
pub struct MemorySink {
    logs: Mutex<Vec<StepLog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> Vec<StepLog> {
        self.logs.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.logs.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn record(&self, log: &StepLog) {
        if let Ok(mut guard) = self.logs.lock() {
            guard.push(log.clone());
        }
    }
}

/// Forwards to several sinks in order.
pub struct FanoutSink<'a> {
    sinks: Vec<&'a dyn LogSink>,
}

impl<'a> FanoutSink<'a> {
    pub fn new(sinks: Vec<&'a dyn LogSink>) -> Self {
        Self { sinks }
    }
}

impl LogSink for FanoutSink<'_> {
    fn record(&self, log: &StepLog) {
        for sink in &self.sinks {
            sink.record(log);
        }
    }
}
