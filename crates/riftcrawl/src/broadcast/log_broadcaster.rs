//! Step log broadcasting for real-time progress streaming.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::pipeline::{LogSink, StepLog};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLogEvent {
    pub timestamp: DateTime<Utc>,
    pub run_id: Option<String>,
    #[serde(flatten)]
    pub log: StepLog,
}

impl StepLogEvent {
    pub fn new(log: StepLog) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id: None,
            log,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Fans recorded step logs out to any number of subscribers.
///
/// Slow receivers lag and lose the oldest events; the pipeline never blocks
/// on them.
#[derive(Clone)]
pub struct StepLogBroadcaster {
    sender: broadcast::Sender<StepLogEvent>,
    run_id: Option<String>,
}

impl StepLogBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            run_id: None,
        }
    }

    /// Tags every event sent through the returned handle with `run_id`.
    pub fn for_run(&self, run_id: impl Into<String>) -> Self {
        Self {
            sender: self.sender.clone(),
            run_id: Some(run_id.into()),
        }
    }

    pub fn send(&self, event: StepLogEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StepLogEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StepLogBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl LogSink for StepLogBroadcaster {
    fn record(&self, log: &StepLog) {
        let event = StepLogEvent::new(log.clone());
        let event = match &self.run_id {
            Some(id) => event.with_run_id(id.clone()),
            None => event,
        };
        self.send(event);
    }
}
