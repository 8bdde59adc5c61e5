use std::fmt;
use std::time::Duration;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Outcome of one unit of step work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Successful,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Successful => f.write_str("SUCCESSFUL"),
            StepStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Record of one externally observable action taken by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLog {
    pub status: StepStatus,
    pub step_name: String,
    pub message: String,
    pub execution_time_ms: u64,
}

impl StepLog {
    pub fn new(
        status: StepStatus,
        step_name: impl Into<String>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            status,
            step_name: step_name.into(),
            message: message.into(),
            execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn successful(
        step_name: impl Into<String>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self::new(StepStatus::Successful, step_name, message, elapsed)
    }

    pub fn failed(
        step_name: impl Into<String>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self::new(StepStatus::Failed, step_name, message, elapsed)
    }

    pub fn is_successful(&self) -> bool {
        self.status == StepStatus::Successful
    }
}

impl fmt::Display for StepLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} ms): {}",
            self.status, self.step_name, self.execution_time_ms, self.message
        )
    }
}

/// Per-run log registry: step name to the ordered logs that step produced.
///
/// Keys keep the order in which steps first opened them. Entries can only be
/// appended; there is no way to remove or rewrite a log once recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepLogs {
    entries: Vec<(String, Vec<StepLog>)>,
}

impl StepLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `step_name` visible in the registry even if it never logs a unit.
    pub fn open(&mut self, step_name: &str) {
        if self.position(step_name).is_none() {
            self.entries.push((step_name.to_string(), Vec::new()));
        }
    }

    /// Appends under the log's own `step_name`.
    pub fn push(&mut self, log: StepLog) {
        match self.position(&log.step_name) {
            Some(idx) => self.entries[idx].1.push(log),
            None => {
                let name = log.step_name.clone();
                self.entries.push((name, vec![log]));
            }
        }
    }

    pub fn get(&self, step_name: &str) -> Option<&[StepLog]> {
        self.position(step_name)
            .map(|idx| self.entries[idx].1.as_slice())
    }

    pub fn contains(&self, step_name: &str) -> bool {
        self.position(step_name).is_some()
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[StepLog])> {
        self.entries
            .iter()
            .map(|(name, logs)| (name.as_str(), logs.as_slice()))
    }

    /// Number of step keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of logs across every step.
    pub fn total_logs(&self) -> usize {
        self.entries.iter().map(|(_, logs)| logs.len()).sum()
    }

    fn position(&self, step_name: &str) -> Option<usize> {
        self.entries.iter().position(|(name, _)| name == step_name)
    }
}

impl Serialize for StepLogs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, logs) in &self.entries {
            map.serialize_entry(name, logs)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_log_constructors() {
        let ok = StepLog::successful("PullMatchesFromRiotStep", "Fetched 20", Duration::from_millis(42));
        assert!(ok.is_successful());
        assert_eq!(ok.execution_time_ms, 42);

        let failed = StepLog::failed("PullMatchesFromRiotStep", "boom", Duration::ZERO);
        assert_eq!(failed.status, StepStatus::Failed);
        assert_eq!(failed.execution_time_ms, 0);
    }

    #[test]
    fn test_push_groups_by_step_name_in_first_seen_order() {
        let mut logs = StepLogs::new();
        logs.push(StepLog::successful("B", "1", Duration::ZERO));
        logs.push(StepLog::successful("A", "2", Duration::ZERO));
        logs.push(StepLog::failed("B", "3", Duration::ZERO));

        let names: Vec<&str> = logs.step_names().collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(logs.get("B").unwrap().len(), 2);
        assert_eq!(logs.get("A").unwrap().len(), 1);
        assert_eq!(logs.total_logs(), 3);
    }

    #[test]
    fn test_open_registers_empty_key_once() {
        let mut logs = StepLogs::new();
        logs.open("PersistPlayersStep");
        logs.open("PersistPlayersStep");

        assert_eq!(logs.len(), 1);
        assert!(logs.get("PersistPlayersStep").unwrap().is_empty());
        assert!(logs.get("Unknown").is_none());
    }

    #[test]
    fn test_serializes_as_ordered_map_with_camel_case_fields() {
        let mut logs = StepLogs::new();
        logs.open("Z");
        logs.push(StepLog::successful("A", "done", Duration::from_millis(5)));

        let json = serde_json::to_string(&logs).unwrap();
        assert_eq!(
            json,
            r#"{"Z":[],"A":[{"status":"SUCCESSFUL","stepName":"A","message":"done","executionTimeMs":5}]}"#
        );
    }

    #[test]
    fn test_display() {
        let log = StepLog::failed("ValidateMatchDetailsStep", "missing id", Duration::from_millis(3));
        assert_eq!(
            log.to_string(),
            "[FAILED] ValidateMatchDetailsStep (3 ms): missing id"
        );
    }
}
