//! Agent definition storage.
//!
//! The engine only consults a store to name the target of an `agent.callAgent` step; it
//! never executes the callee. The CLI also uses the JSON store to list saved agents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use agentflow_types::Agent;
use tracing::warn;

use crate::error::AgentStoreError;

/// Loads and saves agent definitions.
pub trait AgentStore: Send + Sync {
    /// Every stored agent, in storage order.
    fn load_agents(&self) -> Result<Vec<Agent>, AgentStoreError>;

    /// The agent with `agent_id`, if stored.
    fn find_agent(&self, agent_id: &str) -> Result<Option<Agent>, AgentStoreError> {
        Ok(self.load_agents()?.into_iter().find(|agent| agent.id == agent_id))
    }

    /// Inserts `agent`, replacing a stored agent with the same id in place.
    fn save_agent(&self, agent: &Agent) -> Result<(), AgentStoreError>;
}

fn upsert(agents: &mut Vec<Agent>, agent: &Agent) {
    match agents.iter_mut().find(|existing| existing.id == agent.id) {
        Some(existing) => *existing = agent.clone(),
        None => agents.push(agent.clone()),
    }
}

/// In-memory store primarily used for unit testing.
#[derive(Debug, Default)]
pub struct InMemoryAgentStore {
    agents: Mutex<Vec<Agent>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agents(agents: impl IntoIterator<Item = Agent>) -> Self {
        Self {
            agents: Mutex::new(agents.into_iter().collect()),
        }
    }
}

impl AgentStore for InMemoryAgentStore {
    fn load_agents(&self) -> Result<Vec<Agent>, AgentStoreError> {
        Ok(self.agents.lock().expect("agent store lock poisoned").clone())
    }

    fn save_agent(&self, agent: &Agent) -> Result<(), AgentStoreError> {
        upsert(&mut self.agents.lock().expect("agent store lock poisoned"), agent);
        Ok(())
    }
}

/// JSON-backed store persisting all agents as one array.
#[derive(Debug)]
pub struct JsonFileAgentStore {
    path: PathBuf,
    agents: Mutex<Vec<Agent>>,
}

impl JsonFileAgentStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AgentStoreError> {
        let path = path.into();
        let agents = load_agents_file(&path)?;
        Ok(Self {
            path,
            agents: Mutex::new(agents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_locked(&self, agents: &[Agent]) -> Result<(), AgentStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(agents)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl AgentStore for JsonFileAgentStore {
    fn load_agents(&self) -> Result<Vec<Agent>, AgentStoreError> {
        Ok(self.agents.lock().expect("agent store lock poisoned").clone())
    }

    fn find_agent(&self, agent_id: &str) -> Result<Option<Agent>, AgentStoreError> {
        let agents = self.agents.lock().expect("agent store lock poisoned");
        Ok(agents.iter().find(|agent| agent.id == agent_id).cloned())
    }

    fn save_agent(&self, agent: &Agent) -> Result<(), AgentStoreError> {
        let mut agents = self.agents.lock().expect("agent store lock poisoned");
        upsert(&mut agents, agent);
        self.save_locked(&agents)
    }
}

fn load_agents_file(path: &Path) -> Result<Vec<Agent>, AgentStoreError> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
        Ok(content) => match serde_json::from_str(&content) {
            Ok(agents) => Ok(agents),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Failed to parse agent store; starting empty");
                Ok(Vec::new())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(error) => Err(AgentStoreError::Io(error)),
    }
}
