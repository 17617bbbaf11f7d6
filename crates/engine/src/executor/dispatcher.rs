//! Step dispatch: performs the modeled effect of one fully resolved step.
//!
//! Dispatch never touches the output store directly. It reads prior outputs when it needs
//! them and returns the outputs the step declares; the branch runner records them.

use std::sync::Arc;

use agentflow_types::WorkflowStep;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value};
use tracing::{debug, warn};

use crate::agent_store::AgentStore;
use crate::outputs::StepOutputStore;
use crate::text_generation::TextGenerator;

use super::confirmation::confirmation_message;
use super::filter::{FilterCondition, display_operand};
use super::operation::Operation;
use super::types::{StepOutcome, StepSuccess};

/// Prompt used when a text generation step supplies neither `prompt` nor `input`.
pub const DEFAULT_PROMPT: &str = "Generate a short creative story.";

/// Executes one step whose parameters have already been resolved.
#[async_trait]
pub trait StepDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        step: &WorkflowStep,
        parameters: &IndexMap<String, Value>,
        outputs: &StepOutputStore,
        system_prompt: Option<&str>,
    ) -> StepOutcome;
}

/// Default dispatcher keyed by the step's `(integration, operation)` pair.
#[derive(Clone)]
pub struct OperationDispatcher {
    text_generator: Arc<dyn TextGenerator>,
    agent_store: Option<Arc<dyn AgentStore>>,
}

impl OperationDispatcher {
    pub fn new(text_generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            text_generator,
            agent_store: None,
        }
    }

    /// Uses `agent_store` to name the target of `agent.callAgent` steps.
    pub fn with_agent_store(mut self, agent_store: Arc<dyn AgentStore>) -> Self {
        self.agent_store = Some(agent_store);
        self
    }

    async fn generate_text(&self, parameters: &IndexMap<String, Value>, system_prompt: Option<&str>) -> StepOutcome {
        let prompt = prompt_from(parameters);
        match self.text_generator.generate_text(&prompt, system_prompt).await {
            Ok(text) => {
                let mut outputs = JsonMap::new();
                outputs.insert("response".into(), Value::String(text.clone()));
                outputs.insert("output".into(), Value::String(text.clone()));
                StepOutcome::Success(StepSuccess {
                    outputs,
                    message: "AI generated text successfully.".into(),
                    generated_content: Some(text),
                })
            }
            Err(error) => StepOutcome::failure(error.to_string()),
        }
    }

    fn call_agent(&self, parameters: &IndexMap<String, Value>) -> StepOutcome {
        let agent_id = display_operand(parameters.get("agentId"));
        let agent_name = self.agent_store.as_ref().and_then(|store| match store.find_agent(&agent_id) {
            Ok(agent) => agent.map(|agent| agent.name),
            Err(error) => {
                warn!(agent_id = %agent_id, error = %error, "agent store lookup failed");
                None
            }
        });

        let message = match agent_name {
            Some(name) => format!("Successfully initiated a call to agent with ID: {agent_id} (\"{name}\")."),
            None => format!("Successfully initiated a call to agent with ID: {agent_id}."),
        };
        StepOutcome::success(message)
    }
}

#[async_trait]
impl StepDispatcher for OperationDispatcher {
    async fn dispatch(
        &self,
        step: &WorkflowStep,
        parameters: &IndexMap<String, Value>,
        _outputs: &StepOutputStore,
        system_prompt: Option<&str>,
    ) -> StepOutcome {
        let operation = Operation::from_ids(&step.integration_id, &step.operation_id);
        debug!(step_id = %step.id, operation = %operation, "dispatching step");

        match operation {
            Operation::GenerateText | Operation::AnalyzeText => self.generate_text(parameters, system_prompt).await,
            Operation::Filter => evaluate_filter(parameters),
            Operation::CallAgent => self.call_agent(parameters),
            Operation::Unmodeled { integration, operation } => {
                StepOutcome::success(confirmation_message(&integration, &operation, parameters))
            }
        }
    }
}

/// Picks `prompt`, then `input`, then the default prompt. Blank or absent values fall through.
fn prompt_from(parameters: &IndexMap<String, Value>) -> String {
    ["prompt", "input"]
        .iter()
        .filter_map(|key| parameters.get(*key))
        .find_map(|value| match value {
            Value::Null | Value::Bool(false) => None,
            Value::String(text) if text.is_empty() => None,
            other => Some(display_operand(Some(other))),
        })
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string())
}

fn evaluate_filter(parameters: &IndexMap<String, Value>) -> StepOutcome {
    let condition = match FilterCondition::from_parameter(parameters.get("condition")) {
        Ok(condition) => condition,
        Err(unknown) => return StepOutcome::failure(unknown.to_string()),
    };

    let input = parameters.get("input");
    let value = parameters.get("value");
    if condition.evaluate(input, value) {
        return StepOutcome::success("Filter condition met. Continuing branch.");
    }

    StepOutcome::ShortCircuit {
        message: format!(
            "Filter condition NOT met. Stopping branch. ({} {} {})",
            display_operand(input),
            condition,
            display_operand(value)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_store::InMemoryAgentStore;
    use crate::error::TextGenerationError;
    use agentflow_types::{Agent, AgentStatus};
    use indexmap::indexmap;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every prompt and answers with a fixed reply.
    struct EchoGenerator {
        reply: Result<String, TextGenerationError>,
        prompts: Mutex<Vec<(String, Option<String>)>>,
    }

    impl EchoGenerator {
        fn replying(reply: Result<String, TextGenerationError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate_text(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String, TextGenerationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), system_instruction.map(str::to_string)));
            self.reply.clone()
        }
    }

    async fn dispatch(dispatcher: &OperationDispatcher, step: &WorkflowStep) -> StepOutcome {
        dispatcher
            .dispatch(step, &step.parameters, &StepOutputStore::new(), Some("Be brief."))
            .await
    }

    #[tokio::test]
    async fn text_generation_records_response_and_alias() {
        let generator = EchoGenerator::replying(Ok("tech".into()));
        let dispatcher = OperationDispatcher::new(generator.clone());
        let step = WorkflowStep::action("classify", "ai", "analyzeText").with_parameter("input", "Need help with my API");

        let outcome = dispatch(&dispatcher, &step).await;

        let success = match outcome {
            StepOutcome::Success(success) => success,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(success.outputs.get("response"), Some(&json!("tech")));
        assert_eq!(success.outputs.get("output"), Some(&json!("tech")));
        assert_eq!(success.generated_content.as_deref(), Some("tech"));
        assert_eq!(success.message, "AI generated text successfully.");
        assert_eq!(
            generator.prompts.lock().unwrap().as_slice(),
            &[("Need help with my API".to_string(), Some("Be brief.".to_string()))]
        );
    }

    #[tokio::test]
    async fn prompt_falls_back_to_default() {
        let generator = EchoGenerator::replying(Ok("Once upon a time".into()));
        let dispatcher = OperationDispatcher::new(generator.clone());
        let step = WorkflowStep::action("story", "ai", "generateText").with_parameter("prompt", "");

        dispatch(&dispatcher, &step).await;

        assert_eq!(generator.prompts.lock().unwrap()[0].0, DEFAULT_PROMPT);
    }

    #[tokio::test]
    async fn generator_errors_fail_the_step() {
        let generator = EchoGenerator::replying(Err(TextGenerationError::NotConfigured));
        let dispatcher = OperationDispatcher::new(generator);
        let step = WorkflowStep::action("story", "ai", "generateText");

        let outcome = dispatch(&dispatcher, &step).await;

        assert_eq!(
            outcome,
            StepOutcome::failure("Cannot generate text: Gemini API client is not initialized.")
        );
    }

    #[tokio::test]
    async fn unmet_filter_short_circuits() {
        let dispatcher = OperationDispatcher::new(EchoGenerator::replying(Ok(String::new())));
        let step = WorkflowStep::action("gate", "control", "filter")
            .with_parameter("input", "tech")
            .with_parameter("condition", "contains")
            .with_parameter("value", "sales");

        let outcome = dispatch(&dispatcher, &step).await;

        assert_eq!(
            outcome,
            StepOutcome::ShortCircuit {
                message: "Filter condition NOT met. Stopping branch. (tech contains sales)".into()
            }
        );
    }

    #[tokio::test]
    async fn met_filter_continues_and_unknown_condition_fails() {
        let dispatcher = OperationDispatcher::new(EchoGenerator::replying(Ok(String::new())));
        let met = WorkflowStep::action("gate", "control", "filter")
            .with_parameter("input", "5")
            .with_parameter("condition", "greater_than")
            .with_parameter("value", 2);
        assert_eq!(
            dispatch(&dispatcher, &met).await,
            StepOutcome::success("Filter condition met. Continuing branch.")
        );

        let unknown = WorkflowStep::action("gate", "control", "filter").with_parameter("condition", "between");
        assert_eq!(dispatch(&dispatcher, &unknown).await, StepOutcome::failure("Unknown filter condition: between"));

        let missing = WorkflowStep::action("gate", "control", "filter").with_parameter("input", "x");
        assert_eq!(dispatch(&dispatcher, &missing).await, StepOutcome::failure("Unknown filter condition: <none>"));
    }

    #[tokio::test]
    async fn call_agent_names_stored_target() {
        let store = InMemoryAgentStore::with_agents([Agent {
            id: "agent-sales".into(),
            name: "Sales Desk".into(),
            description: None,
            trigger: None,
            actions: Vec::new(),
            system_prompt: None,
            status: AgentStatus::Active,
            ..Agent::default()
        }]);
        let dispatcher = OperationDispatcher::new(EchoGenerator::replying(Ok(String::new()))).with_agent_store(Arc::new(store));

        let known = WorkflowStep::action("handoff", "agent", "callAgent").with_parameter("agentId", "agent-sales");
        assert_eq!(
            dispatch(&dispatcher, &known).await,
            StepOutcome::success("Successfully initiated a call to agent with ID: agent-sales (\"Sales Desk\").")
        );

        let unknown = WorkflowStep::action("handoff", "agent", "callAgent").with_parameter("agentId", "agent-ghost");
        assert_eq!(
            dispatch(&dispatcher, &unknown).await,
            StepOutcome::success("Successfully initiated a call to agent with ID: agent-ghost.")
        );
    }

    #[tokio::test]
    async fn unmodeled_operations_always_succeed() {
        let dispatcher = OperationDispatcher::new(EchoGenerator::replying(Ok(String::new())));
        let step = WorkflowStep {
            parameters: indexmap! { "channel".to_string() => json!("#leads") },
            ..WorkflowStep::action("notify", "slack", "sendMessage")
        };

        assert_eq!(dispatch(&dispatcher, &step).await, StepOutcome::success("Message posted to #leads."));
    }
}
