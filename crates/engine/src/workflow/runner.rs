//! Workflow orchestration: fires the trigger, runs every branch concurrently and derives
//! the run's verdict.
//!
//! A run owns its [`StepOutputStore`]; nothing is shared between runs, so one engine can
//! drive any number of runs at the same time. Log entries are delivered to the caller's
//! [`LogSink`] as they happen.

use std::sync::Arc;
use std::time::Duration;

use agentflow_types::{Agent, LogEntry, LogSeverity, RunResult, TriggerInput, WorkflowStep};
use agentflow_util::EngineSettings;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::agent_store::AgentStore;
use crate::executor::{BranchContext, OperationDispatcher, StepDispatcher, run_branch};
use crate::log::LogSink;
use crate::outputs::StepOutputStore;
use crate::text_generation::TextGenerator;

use super::state::{RunPhase, RunState};
use super::trigger::trigger_payload;

/// Runs agent workflows against a fixed set of collaborators.
#[derive(Clone)]
pub struct WorkflowEngine {
    dispatcher: Arc<dyn StepDispatcher>,
    step_timeout: Option<Duration>,
}

impl WorkflowEngine {
    /// Engine using the default dispatcher over `text_generator`.
    pub fn new(text_generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_dispatcher(Arc::new(OperationDispatcher::new(text_generator)))
    }

    /// Engine whose `agent.callAgent` steps name their target through `agent_store`.
    pub fn with_agent_store(text_generator: Arc<dyn TextGenerator>, agent_store: Arc<dyn AgentStore>) -> Self {
        Self::with_dispatcher(Arc::new(OperationDispatcher::new(text_generator).with_agent_store(agent_store)))
    }

    /// Engine delegating every step to `dispatcher`.
    pub fn with_dispatcher(dispatcher: Arc<dyn StepDispatcher>) -> Self {
        Self {
            dispatcher,
            step_timeout: None,
        }
    }

    /// Engine configured from `settings`.
    pub fn from_settings(
        settings: &EngineSettings,
        text_generator: Arc<dyn TextGenerator>,
        agent_store: Option<Arc<dyn AgentStore>>,
    ) -> Self {
        let engine = match agent_store {
            Some(store) => Self::with_agent_store(text_generator, store),
            None => Self::new(text_generator),
        };
        engine.with_step_timeout(settings.step_timeout())
    }

    /// Bounds every step dispatch. `None` lets steps run for as long as they need.
    pub fn with_step_timeout(mut self, step_timeout: Option<Duration>) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }

    /// Runs a stored agent with its own system prompt.
    pub async fn run_agent(&self, agent: &Agent, sink: &dyn LogSink, trigger_input: Option<&TriggerInput>) -> RunResult {
        info!(agent_id = %agent.id, agent = %agent.name, "running agent");
        self.run_agent_workflow(
            agent.trigger.as_ref(),
            &agent.actions,
            sink,
            agent.system_prompt.as_deref(),
            trigger_input,
        )
        .await
    }

    /// Executes one run.
    ///
    /// Without a trigger the run fails immediately and no branch starts. Otherwise the trigger
    /// output is recorded (from `trigger_input` when it covers the trigger, else a synthesized
    /// payload) and all branches run concurrently against the same output store. The run
    /// succeeds iff no branch had a failed step; a failing branch never cancels its siblings.
    pub async fn run_agent_workflow(
        &self,
        trigger: Option<&WorkflowStep>,
        actions: &[Vec<WorkflowStep>],
        sink: &dyn LogSink,
        system_prompt: Option<&str>,
        trigger_input: Option<&TriggerInput>,
    ) -> RunResult {
        let mut state = RunState::new();
        sink.emit(LogEntry::new(LogSeverity::Info, "Starting run..."));

        let Some(trigger) = trigger else {
            warn!("run aborted: no trigger defined");
            sink.emit(LogEntry::new(LogSeverity::Failure, "FAILURE: No trigger defined for this agent."));
            state.advance(RunPhase::Completed { success: false });
            return RunResult::aborted();
        };

        info!(trigger_id = %trigger.id, operation = %trigger.operation_label(), branches = actions.len(), "workflow run started");
        sink.emit(LogEntry::new(LogSeverity::Info, format!("Executing trigger: \"{}\"", trigger.name)));

        let payload = trigger_payload(trigger, trigger_input);
        let rendered = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string());
        let outputs = StepOutputStore::new();
        outputs.record(trigger.id.clone(), payload);
        state.advance(RunPhase::TriggerFired);
        sink.emit(LogEntry::new(
            LogSeverity::Success,
            format!("SUCCESS: Trigger fired successfully. Output:\n{rendered}"),
        ));

        let context = BranchContext {
            dispatcher: self.dispatcher.as_ref(),
            sink,
            system_prompt,
            step_timeout: self.step_timeout,
        };
        state.advance(RunPhase::BranchesRunning);
        let reports = join_all(
            actions
                .iter()
                .enumerate()
                .map(|(index, steps)| run_branch(index, steps, &outputs, context)),
        )
        .await;

        let result = RunResult::from_branches(reports);
        state.advance(RunPhase::Completed { success: result.success });
        info!(phase = %state.phase(), branches = result.branches.len(), "workflow run finished");
        sink.emit(LogEntry::new(LogSeverity::Info, "Run finished."));
        result
    }
}
