//! Sequential execution of one branch of action steps.

use std::time::Duration;

use agentflow_types::{BranchOutcome, BranchReport, LogSeverity, WorkflowStep};
use agentflow_util::{redact_sensitive, truncate_for_log};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::log::{BranchLogger, LogSink};
use crate::outputs::StepOutputStore;
use crate::resolve::{find_unresolved_in_parameters, resolve_parameters};

use super::dispatcher::StepDispatcher;
use super::types::StepOutcome;

const TRACE_PREVIEW_CHARS: usize = 200;

/// Collaborators and run-wide settings shared by every branch of a run.
#[derive(Clone, Copy)]
pub struct BranchContext<'a> {
    pub dispatcher: &'a dyn StepDispatcher,
    pub sink: &'a dyn LogSink,
    pub system_prompt: Option<&'a str>,
    pub step_timeout: Option<Duration>,
}

/// Runs `steps` in order against the shared output store.
///
/// Each step's parameters are resolved against whatever is recorded when the step starts.
/// A short-circuit ends the branch as [`BranchOutcome::Stopped`]; a failure ends it as
/// [`BranchOutcome::Failed`] and no later step is dispatched.
pub async fn run_branch(index: usize, steps: &[WorkflowStep], outputs: &StepOutputStore, context: BranchContext<'_>) -> BranchReport {
    let log = BranchLogger::new(context.sink, index);
    let mut steps_executed = 0;

    for (position, step) in steps.iter().enumerate() {
        let (parameters, unresolved) = outputs.read(|recorded| {
            (
                resolve_parameters(&step.parameters, recorded),
                find_unresolved_in_parameters(&step.parameters, recorded),
            )
        });

        let rendered = serde_json::to_string_pretty(&parameters).unwrap_or_else(|_| "{}".to_string());
        debug!(
            branch = index,
            step_id = %step.id,
            operation = %step.operation_label(),
            params = %redact_sensitive(&rendered),
            "executing step"
        );
        log.emit(
            LogSeverity::Info,
            format!("Executing step {}: \"{}\"\nwith params: {}", position + 1, step.name, rendered),
        );

        if !unresolved.is_empty() {
            log.emit(
                LogSeverity::Warning,
                format!("Unresolved placeholders in step \"{}\": {}", step.name, unresolved.join(", ")),
            );
        }

        steps_executed += 1;
        match dispatch_step(step, &parameters, outputs, &context).await {
            StepOutcome::Success(success) => {
                if !success.outputs.is_empty() {
                    outputs.record(step.id.clone(), success.outputs);
                }
                if let Some(content) = success.generated_content {
                    debug!(branch = index, step_id = %step.id, content = %truncate_for_log(&content, TRACE_PREVIEW_CHARS), "generated content");
                    log.emit(LogSeverity::GeneratedContent, format!("AI Response:\n{content}"));
                }
                log.emit(LogSeverity::Success, format!("SUCCESS: {}", success.message));
            }
            StepOutcome::ShortCircuit { message } => {
                debug!(branch = index, step_id = %step.id, "branch stopped by filter");
                log.emit(LogSeverity::Info, message);
                return report(index, BranchOutcome::Stopped, steps_executed);
            }
            StepOutcome::Failure { reason } => {
                warn!(branch = index, step_id = %step.id, operation = %step.operation_label(), reason = %reason, "step failed");
                log.emit(LogSeverity::Failure, format!("FAILURE: {reason}"));
                return report(index, BranchOutcome::Failed, steps_executed);
            }
        }
    }

    report(index, BranchOutcome::Completed, steps_executed)
}

async fn dispatch_step(
    step: &WorkflowStep,
    parameters: &IndexMap<String, Value>,
    outputs: &StepOutputStore,
    context: &BranchContext<'_>,
) -> StepOutcome {
    let dispatch = context.dispatcher.dispatch(step, parameters, outputs, context.system_prompt);
    let Some(limit) = context.step_timeout else {
        return dispatch.await;
    };

    match tokio::time::timeout(limit, dispatch).await {
        Ok(outcome) => outcome,
        Err(_) => StepOutcome::failure(format!("Step '{}' timed out after {}ms", step.name, limit.as_millis())),
    }
}

fn report(index: usize, outcome: BranchOutcome, steps_executed: usize) -> BranchReport {
    BranchReport {
        index,
        outcome,
        steps_executed,
    }
}
