use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::log::{StepLog, StepLogs, StepStatus};

/// Timestamp format used in `LogSummary::generated_at`.
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Aggregate view over the logs of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLogSummary {
    pub step_name: String,
    pub average_execution_time_ms: u64,
    pub total_execution_time_ms: u64,
    pub success_count: usize,
    pub failed_count: usize,
}

impl StepLogSummary {
    pub fn from_step_logs(step_name: &str, logs: &[StepLog]) -> Self {
        let total_execution_time_ms = logs
            .iter()
            .fold(0u64, |acc, log| acc.saturating_add(log.execution_time_ms));

        let average_execution_time_ms = if logs.is_empty() {
            0
        } else {
            total_execution_time_ms / logs.len() as u64
        };

        let success_count = logs
            .iter()
            .filter(|log| log.status == StepStatus::Successful)
            .count();
        let failed_count = logs
            .iter()
            .filter(|log| log.status == StepStatus::Failed)
            .count();

        Self {
            step_name: step_name.to_string(),
            average_execution_time_ms,
            total_execution_time_ms,
            success_count,
            failed_count,
        }
    }

    pub fn count(&self) -> usize {
        self.success_count + self.failed_count
    }
}

/// Per-step summaries for one run plus the time they were generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    #[serde(serialize_with = "serialize_steps")]
    pub steps: Vec<StepLogSummary>,
    pub generated_at: String,
}

impl LogSummary {
    pub fn step(&self, step_name: &str) -> Option<&StepLogSummary> {
        self.steps.iter().find(|s| s.step_name == step_name)
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.step_name.as_str())
    }

    /// Expected steps that have no entry, in the order given.
    pub fn missing_steps(&self, expected: &[&str]) -> Vec<String> {
        expected
            .iter()
            .filter(|name| self.step(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    pub fn total_failed(&self) -> usize {
        self.steps.iter().map(|s| s.failed_count).sum()
    }
}

fn serialize_steps<S: Serializer>(steps: &[StepLogSummary], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(steps.len()))?;
    for summary in steps {
        map.serialize_entry(&summary.step_name, summary)?;
    }
    map.end()
}

/// Reduces a run's log registry into a summary stamped with the local time.
pub fn reduce(logs: &StepLogs) -> LogSummary {
    let now = chrono::Local::now().format(GENERATED_AT_FORMAT).to_string();
    reduce_at(logs, now)
}

/// Same as [`reduce`] with a caller-supplied timestamp.
pub fn reduce_at(logs: &StepLogs, generated_at: impl Into<String>) -> LogSummary {
    let steps = logs
        .iter()
        .map(|(name, entries)| StepLogSummary::from_step_logs(name, entries))
        .collect();

    LogSummary {
        steps,
        generated_at: generated_at.into(),
    }
}
