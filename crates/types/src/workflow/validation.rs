//! Structural checks for agent definitions.
//!
//! Runs do not enforce these rules themselves; callers (the CLI, editors) use them to refuse
//! obviously broken agents before starting a run.

use std::collections::HashSet;

use super::{Agent, StepKind, WorkflowStep};

/// Collects every structural problem found in `agent`.
///
/// Returns `Ok(())` when the agent is well formed, otherwise the list of messages in
/// discovery order (trigger first, then branches).
pub fn validate_agent(agent: &Agent) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    let mut seen_ids = HashSet::new();

    if let Some(trigger) = &agent.trigger {
        if trigger.kind != StepKind::Trigger {
            problems.push(format!("trigger step '{}' must have type 'trigger'", trigger.id));
        }
        check_step(trigger, &mut seen_ids, &mut problems);
    }

    for (branch_index, branch) in agent.actions.iter().enumerate() {
        for step in branch {
            if step.kind != StepKind::Action {
                problems.push(format!(
                    "step '{}' in branch {} must have type 'action'",
                    step.id,
                    branch_index + 1
                ));
            }
            check_step(step, &mut seen_ids, &mut problems);
        }
    }

    if problems.is_empty() { Ok(()) } else { Err(problems) }
}

fn check_step<'a>(step: &'a WorkflowStep, seen_ids: &mut HashSet<&'a str>, problems: &mut Vec<String>) {
    if step.id.trim().is_empty() {
        problems.push("step identifiers cannot be empty".to_string());
    } else if !seen_ids.insert(step.id.as_str()) {
        problems.push(format!("duplicate step identifier '{}'", step.id));
    }
    if step.integration_id.trim().is_empty() {
        problems.push(format!("step '{}' is missing an integration id", step.id));
    }
    if step.operation_id.trim().is_empty() {
        problems.push(format!("step '{}' is missing an operation", step.id));
    }
}
