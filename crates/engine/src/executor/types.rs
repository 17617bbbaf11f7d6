//! Core executor data types.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// What a successful dispatch produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSuccess {
    /// Named outputs to record under the step id. Empty when the step declares none.
    #[serde(default)]
    pub outputs: JsonMap<String, Value>,
    /// Text for the step's success log line.
    pub message: String,
    /// Raw generated text, surfaced as its own log line.
    #[serde(default)]
    pub generated_content: Option<String>,
}

impl StepSuccess {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Result of dispatching one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step ran; the branch continues.
    Success(StepSuccess),
    /// A filter condition was not met; the branch ends without failing.
    ShortCircuit { message: String },
    /// The step failed; the branch ends and the run is marked failed.
    Failure { reason: String },
}

impl StepOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        StepOutcome::Success(StepSuccess::message(message))
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        StepOutcome::Failure { reason: reason.into() }
    }
}
