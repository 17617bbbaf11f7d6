//! # Agentflow Engine
//!
//! The Agentflow Engine executes workflow agents: one trigger plus parallel branches of
//! ordered steps, with values flowing between steps through `{{outputs.<stepId>.<outputId>}}`
//! placeholders.
//!
//! ## Key Features
//!
//! - **Placeholder Resolution**: Parameters are resolved against outputs recorded before the step starts
//! - **Concurrent Branches**: Branches run together; a failing branch never cancels its siblings
//! - **Conditional Short-Circuit**: Filter steps end their branch cleanly when a condition is not met
//! - **Streaming Log**: Every log entry reaches the caller's [`LogSink`] as soon as it is produced
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use agentflow_engine::{MemoryLogSink, TextGenerationError, TextGenerator, WorkflowEngine, parse_agent_file};
//!
//! struct Canned;
//!
//! #[async_trait::async_trait]
//! impl TextGenerator for Canned {
//!     async fn generate_text(&self, _prompt: &str, _system: Option<&str>) -> Result<String, TextGenerationError> {
//!         Ok("tech".to_string())
//!     }
//! }
//!
//! let temp_dir = tempfile::tempdir()?;
//! let agent_path = temp_dir.path().join("triage.yaml");
//! std::fs::write(&agent_path, r#"
//! id: agent-triage
//! name: Triage
//! trigger:
//!   id: inbox
//!   type: trigger
//!   integrationId: gmail
//!   operation: onNewEmail
//!   name: New email
//! actions:
//!   - - id: classify
//!       type: action
//!       integrationId: ai
//!       operation: analyzeText
//!       name: Classify
//!       parameters:
//!         input: "{{outputs.inbox.body}}"
//! "#)?;
//!
//! let agents = parse_agent_file(&agent_path)?;
//! let engine = WorkflowEngine::new(Arc::new(Canned));
//! let sink = MemoryLogSink::new();
//! let runtime = tokio::runtime::Runtime::new()?;
//! let result = runtime.block_on(engine.run_agent(&agents[0], &sink, None));
//! assert!(result.success);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`resolve`**: Placeholder resolution
//! - **`outputs`**: Run-scoped step output store
//! - **`executor`**: Step dispatch and sequential branch execution
//! - **`workflow`**: Trigger seeding, run lifecycle and the [`WorkflowEngine`] entry point
//! - **`text_generation`** / **`agent_store`**: Collaborator traits and their implementations

use std::{fs, path::Path};

use agentflow_types::Agent;
use anyhow::{Context, Result};
use serde::Deserialize;

pub mod agent_store;
pub mod error;
pub mod executor;
pub mod log;
pub mod outputs;
pub mod resolve;
pub mod text_generation;
pub mod workflow;

// Re-export commonly used types for convenience
pub use agent_store::{AgentStore, InMemoryAgentStore, JsonFileAgentStore};
pub use error::{AgentStoreError, TextGenerationError};
pub use executor::{OperationDispatcher, StepDispatcher, StepOutcome, StepSuccess};
pub use log::{ChannelLogSink, LogSink, MemoryLogSink};
pub use outputs::StepOutputStore;
pub use text_generation::{GeminiTextGenerator, TextGenerator};
pub use workflow::{RunPhase, WorkflowEngine};

/// Loads agent definitions from a YAML or JSON file.
///
/// Three layouts are accepted:
/// - a single agent document
/// - a sequence of agents (the layout of the JSON agent store)
/// - a document with the agents under an `agents` key
///
/// # Errors
///
/// Returns an error if the file cannot be read or matches none of the layouts.
///
/// # Examples
///
/// ```rust
/// use agentflow_engine::parse_agent_file;
///
/// let temp_dir = tempfile::tempdir()?;
/// let agent_path = temp_dir.path().join("agents.json");
/// std::fs::write(&agent_path, r#"[{"id": "a1", "name": "First"}, {"id": "a2", "name": "Second"}]"#)?;
///
/// let agents = parse_agent_file(&agent_path)?;
/// assert_eq!(agents.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_agent_file(file_path: impl AsRef<Path>) -> Result<Vec<Agent>> {
    let file_path = file_path.as_ref();
    let file_content = fs::read(file_path).with_context(|| format!("Failed to read agent file: {}", file_path.display()))?;
    let content_string = String::from_utf8_lossy(&file_content);

    #[derive(Deserialize)]
    struct MultiAgentDocument {
        agents: Vec<Agent>,
    }

    if let Ok(document) = serde_yaml::from_str::<MultiAgentDocument>(&content_string) {
        return Ok(document.agents);
    }

    if let Ok(agents) = serde_yaml::from_str::<Vec<Agent>>(&content_string) {
        return Ok(agents);
    }

    match serde_yaml::from_str::<Agent>(&content_string) {
        Ok(agent) => Ok(vec![agent]),
        Err(error) => Err(anyhow::anyhow!(error)).with_context(|| {
            format!(
                "Unsupported agent document format in {}. Expected a single agent, a list of agents, \
                 or agents under an 'agents' key",
                file_path.display()
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agent_file_single_agent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let agent_path = temp_dir.path().join("agent.yaml");

        let agent_content = r##"
id: "agent-sales"
name: "Sales follow-up"
systemPrompt: "You are a sales assistant."
trigger:
  id: "hook"
  type: "trigger"
  integrationId: "webhook"
  operation: "onWebhook"
  name: "Incoming lead"
actions:
  - - id: "notify"
      type: "action"
      integrationId: "slack"
      operationId: "sendMessage"
      name: "Notify"
      parameters:
        channel: "#sales"
"##;

        fs::write(&agent_path, agent_content).unwrap();

        let agents = parse_agent_file(&agent_path).expect("parse single agent");
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, "agent-sales");
        assert_eq!(agents[0].system_prompt.as_deref(), Some("You are a sales assistant."));
        assert_eq!(agents[0].actions[0][0].operation_id, "sendMessage");
        assert_eq!(agents[0].actions[0][0].parameters["channel"], serde_json::json!("#sales"));
    }

    #[test]
    fn test_parse_agent_file_multi_agent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let agent_path = temp_dir.path().join("bundle.yaml");

        let agent_content = r#"
agents:
  - id: "agent-sales"
    name: "Sales"
  - id: "agent-tech"
    name: "Tech"
"#;

        fs::write(&agent_path, agent_content).unwrap();

        let agents = parse_agent_file(&agent_path).expect("parse agent bundle");
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[1].name, "Tech");
        assert!(agents[0].trigger.is_none());
    }

    #[test]
    fn test_parse_agent_file_rejects_unknown_layout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let agent_path = temp_dir.path().join("broken.yaml");
        fs::write(&agent_path, "workflow: deploy\nsteps: []\n").unwrap();

        let error = parse_agent_file(&agent_path).unwrap_err();
        assert!(format!("{error:#}").contains("Unsupported agent document format"));
    }
}
