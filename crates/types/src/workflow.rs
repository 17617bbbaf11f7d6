//! Agent and workflow step definitions.
//!
//! These structures are what an agent store persists and what the engine consumes. Step
//! parameters keep authoring order (via `IndexMap`) so logs and editors render them in the
//! sequence the author wrote them. Parameter strings may embed placeholders of the form
//! `{{outputs.<stepId>.<outputId>}}`; they are stored verbatim and only resolved at run time.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod validation;

pub use validation::validate_agent;

/// Distinguishes the single trigger step from the action steps of a workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Starts a run and seeds the initial outputs.
    Trigger,
    /// Runs inside a branch after the trigger fired.
    Action,
}

/// A single step bound to an integration operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// Identifier unique within a workflow; placeholders reference it.
    pub id: String,
    /// Whether this is the trigger or an action.
    #[serde(rename = "type", alias = "kind")]
    pub kind: StepKind,
    /// Integration the operation belongs to (for example, `gmail` or `control`).
    pub integration_id: String,
    /// Operation identifier within the integration (for example, `sendEmail`).
    #[serde(rename = "operation", alias = "operationId")]
    pub operation_id: String,
    /// Display name shown in logs.
    #[serde(default)]
    pub name: String,
    /// Operation parameters in authoring order.
    #[serde(default)]
    pub parameters: IndexMap<String, JsonValue>,
}

impl WorkflowStep {
    /// Builds a trigger step with no parameters.
    pub fn trigger(id: impl Into<String>, integration_id: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self::new(id, StepKind::Trigger, integration_id, operation_id)
    }

    /// Builds an action step with no parameters.
    pub fn action(id: impl Into<String>, integration_id: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self::new(id, StepKind::Action, integration_id, operation_id)
    }

    fn new(id: impl Into<String>, kind: StepKind, integration_id: impl Into<String>, operation_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            integration_id: integration_id.into(),
            operation_id: operation_id.into(),
            parameters: IndexMap::new(),
        }
    }

    /// Sets the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds or replaces a parameter, keeping first-insertion order.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the `integration.operation` label used in logs and telemetry.
    pub fn operation_label(&self) -> String {
        format!("{}.{}", self.integration_id, self.operation_id)
    }
}

/// Activation state of a stored agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    #[default]
    Inactive,
}

/// A composed workflow agent: one trigger plus parallel branches of ordered steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Stable identifier used by `agent.callAgent` steps.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Optional one-line summary.
    #[serde(default)]
    pub description: Option<String>,
    /// Step that starts the workflow. An agent without one cannot run.
    #[serde(default)]
    pub trigger: Option<WorkflowStep>,
    /// Branches of action steps. Branches run concurrently; steps inside a branch run in order.
    #[serde(default)]
    pub actions: Vec<Vec<WorkflowStep>>,
    /// Instruction forwarded to every text-generation step of a run.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub total_runs: u64,
    #[serde(default)]
    pub successful_runs: u64,
    /// Finish time of the most recent run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

impl Agent {
    /// Iterates over every step of the agent, trigger first, then branches in order.
    pub fn steps(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.trigger.iter().chain(self.actions.iter().flatten())
    }

    /// Counts a finished run.
    pub fn record_run(&mut self, success: bool, finished_at: DateTime<Utc>) {
        self.total_runs += 1;
        if success {
            self.successful_runs += 1;
        }
        self.last_run = Some(finished_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_persisted_agent() {
        let yaml_text = r#"
id: agent-triage
name: Email triage
trigger:
  id: trigger-1
  type: trigger
  integrationId: gmail
  operation: onNewEmail
  name: On new email
actions:
  - - id: classify
      type: action
      integrationId: ai
      operation: analyzeText
      name: Classify
      parameters:
        input: "{{outputs.trigger-1.body}}"
        instructions: classify as sales or tech
systemPrompt: You are a terse classifier.
"#;

        let agent: Agent = serde_yaml::from_str(yaml_text).expect("deserialize agent");

        assert_eq!(agent.id, "agent-triage");
        assert_eq!(agent.status, AgentStatus::Inactive);
        let trigger = agent.trigger.as_ref().expect("trigger");
        assert_eq!(trigger.kind, StepKind::Trigger);
        assert_eq!(trigger.operation_id, "onNewEmail");
        assert_eq!(agent.actions.len(), 1);
        let classify = &agent.actions[0][0];
        assert_eq!(classify.operation_label(), "ai.analyzeText");
        let keys: Vec<&str> = classify.parameters.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["input", "instructions"]);
        assert_eq!(agent.system_prompt.as_deref(), Some("You are a terse classifier."));
    }

    #[test]
    fn accepts_operation_id_alias_and_serializes_canonical_keys() {
        let step: WorkflowStep = serde_json::from_value(json!({
            "id": "notify",
            "kind": "action",
            "integrationId": "slack",
            "operationId": "sendMessage",
        }))
        .expect("deserialize step");

        assert_eq!(step.operation_id, "sendMessage");
        assert!(step.parameters.is_empty());

        let encoded = serde_json::to_value(&step).expect("serialize step");
        assert_eq!(encoded["type"], "action");
        assert_eq!(encoded["operation"], "sendMessage");
        assert_eq!(encoded["integrationId"], "slack");
    }

    #[test]
    fn steps_iterates_trigger_then_branches() {
        let agent = Agent {
            id: "a".into(),
            name: "A".into(),
            description: None,
            trigger: Some(WorkflowStep::trigger("t", "webhook", "onWebhook")),
            actions: vec![
                vec![WorkflowStep::action("b1", "slack", "sendMessage")],
                vec![WorkflowStep::action("b2", "gmail", "sendEmail")],
            ],
            system_prompt: None,
            status: AgentStatus::Active,
            ..Agent::default()
        };

        let ids: Vec<&str> = agent.steps().map(|step| step.id.as_str()).collect();
        assert_eq!(ids, vec!["t", "b1", "b2"]);
    }

    #[test]
    fn record_run_updates_counters() {
        let mut agent = Agent::default();
        let finished_at = DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z").unwrap().with_timezone(&Utc);

        agent.record_run(true, finished_at);
        agent.record_run(false, finished_at);

        assert_eq!(agent.total_runs, 2);
        assert_eq!(agent.successful_runs, 1);
        assert_eq!(agent.last_run, Some(finished_at));
        let encoded = serde_json::to_value(&agent).expect("serialize agent");
        assert_eq!(encoded["totalRuns"], 2);
        assert_eq!(encoded["lastRun"], "2026-03-01T09:30:00Z");
    }
}
