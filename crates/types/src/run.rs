//! Run-time records produced while executing an agent workflow.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Outputs recorded during a run: step id to that step's named output values.
pub type StepOutputs = HashMap<String, JsonMap<String, JsonValue>>;

/// Caller-supplied trigger payloads keyed by trigger step id.
pub type TriggerInput = HashMap<String, JsonMap<String, JsonValue>>;

/// Severity of a streamed log line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogSeverity {
    Info,
    Success,
    /// Recoverable oddities, such as placeholders that could not be resolved.
    Warning,
    Failure,
    /// Raw text returned by the text generation service.
    GeneratedContent,
}

impl LogSeverity {
    /// Upper-case tag used by the plain-text log renderer.
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Info => "INFO",
            LogSeverity::Success => "SUCCESS",
            LogSeverity::Warning => "WARNING",
            LogSeverity::Failure => "FAILURE",
            LogSeverity::GeneratedContent => "AI_RESPONSE",
        }
    }
}

/// One line of the ordered run log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: LogSeverity,
    /// Zero-based branch index, or `None` for run-level lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<usize>,
    pub text: String,
}

impl LogEntry {
    /// Creates a run-level entry stamped with the current time.
    pub fn new(severity: LogSeverity, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            branch: None,
            text: text.into(),
        }
    }

    /// Creates an entry attributed to a branch.
    pub fn for_branch(branch: usize, severity: LogSeverity, text: impl Into<String>) -> Self {
        Self {
            branch: Some(branch),
            ..Self::new(severity, text)
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.severity.label(),
            self.text
        )
    }
}

/// How a single branch ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchOutcome {
    /// Every step ran and succeeded.
    Completed,
    /// A filter condition was not met; the remaining steps were skipped.
    Stopped,
    /// A step failed; the remaining steps were skipped.
    Failed,
}

impl BranchOutcome {
    /// Returns true unless a step failed.
    pub fn is_success(self) -> bool {
        !matches!(self, BranchOutcome::Failed)
    }
}

/// Summary of one branch of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchReport {
    /// Zero-based branch index.
    pub index: usize,
    pub outcome: BranchOutcome,
    /// Number of steps that were dispatched, including the one that stopped or failed the branch.
    pub steps_executed: usize,
}

/// Final verdict of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RunResult {
    /// True iff every branch finished without a failed step.
    pub success: bool,
    /// Per-branch summaries in declaration order. Empty when the run never reached its branches.
    #[serde(default)]
    pub branches: Vec<BranchReport>,
}

impl RunResult {
    /// A run that ended before any branch started.
    pub fn aborted() -> Self {
        Self::default()
    }

    /// Derives the verdict from the branch reports.
    pub fn from_branches(branches: Vec<BranchReport>) -> Self {
        let success = branches.iter().all(|report| report.outcome.is_success());
        Self { success, branches }
    }
}
