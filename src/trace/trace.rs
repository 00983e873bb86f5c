use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Errored,
}

/// One executed step, as written to the JSONL trace.
#[derive(Debug, Serialize)]
pub struct StepEvent {
    pub timestamp_ms: u128,
    pub scenario: String,

    /// `None` for setup and cleanup phases
    pub step_index: Option<usize>,
    pub step: String,

    pub status: StepStatus,
    pub duration_ms: u128,

    pub detail: Option<String>,
}

impl StepEvent {
    pub fn now(scenario: &str, step_index: Option<usize>, step: impl ToString) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            scenario: scenario.to_string(),
            step_index,
            step: step.to_string(),
            status: StepStatus::Passed,
            duration_ms: 0,
            detail: None,
        }
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
