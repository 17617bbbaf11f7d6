//! Mapping from a step's `(integration, operation)` pair to the behavior it gets.

use std::fmt;

/// Behavior selected for a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `ai.generateText`
    GenerateText,
    /// `ai.analyzeText`
    AnalyzeText,
    /// `control.filter`
    Filter,
    /// `agent.callAgent`
    CallAgent,
    /// Any other pair; its external effect is modeled, not performed.
    Unmodeled { integration: String, operation: String },
}

impl Operation {
    pub fn from_ids(integration_id: &str, operation_id: &str) -> Self {
        match (integration_id, operation_id) {
            ("ai", "generateText") => Operation::GenerateText,
            ("ai", "analyzeText") => Operation::AnalyzeText,
            ("control", "filter") => Operation::Filter,
            ("agent", "callAgent") => Operation::CallAgent,
            (integration, operation) => Operation::Unmodeled {
                integration: integration.to_string(),
                operation: operation.to_string(),
            },
        }
    }

    /// True for operations served by the text generation service.
    pub fn is_text_generation(&self) -> bool {
        matches!(self, Operation::GenerateText | Operation::AnalyzeText)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GenerateText => f.write_str("ai.generateText"),
            Operation::AnalyzeText => f.write_str("ai.analyzeText"),
            Operation::Filter => f.write_str("control.filter"),
            Operation::CallAgent => f.write_str("agent.callAgent"),
            Operation::Unmodeled { integration, operation } => write!(f, "{integration}.{operation}"),
        }
    }
}
