//! Per-sink outcome collection.
//!
//! Sinks are independent: a failing sink is recorded here and the job
//! moves on to the next one.

use std::fmt;

use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkStatus {
    /// The sink ran; the detail names what was written.
    Written(String),
    /// The sink was not attempted.
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOutcome {
    pub sink: String,
    pub status: SinkStatus,
}

impl fmt::Display for SinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SinkStatus::Written(detail) => write!(f, "{}: written ({detail})", self.sink),
            SinkStatus::Skipped(reason) => write!(f, "{}: skipped ({reason})", self.sink),
            SinkStatus::Failed(err) => write!(f, "{}: failed ({err})", self.sink),
        }
    }
}

/// Outcomes of every sink a job ran, in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct SinkOutcomes {
    entries: Vec<SinkOutcome>,
}

impl SinkOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&mut self, sink: &str, detail: impl Into<String>) {
        let detail = detail.into();
        info!(sink, detail = %detail, "sink written");
        self.push(sink, SinkStatus::Written(detail));
    }

    pub fn skipped(&mut self, sink: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(sink, reason = %reason, "sink skipped");
        self.push(sink, SinkStatus::Skipped(reason));
    }

    pub fn failed(&mut self, sink: &str, err: impl fmt::Display) {
        let message = err.to_string();
        error!(sink, error = %message, "sink failed");
        self.push(sink, SinkStatus::Failed(message));
    }

    /// Records `result`, describing a success with `describe`.
    pub fn record<T, E: fmt::Display>(
        &mut self,
        sink: &str,
        result: Result<T, E>,
        describe: impl FnOnce(&T) -> String,
    ) {
        match result {
            Ok(value) => self.written(sink, describe(&value)),
            Err(err) => self.failed(sink, err),
        }
    }

    fn push(&mut self, sink: &str, status: SinkStatus) {
        self.entries.push(SinkOutcome {
            sink: sink.to_string(),
            status,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &SinkOutcome> {
        self.entries.iter()
    }

    pub fn get(&self, sink: &str) -> Option<&SinkStatus> {
        self.entries
            .iter()
            .find(|outcome| outcome.sink == sink)
            .map(|outcome| &outcome.status)
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|outcome| matches!(outcome.status, SinkStatus::Failed(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
