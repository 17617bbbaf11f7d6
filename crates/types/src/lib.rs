//! Shared type definitions for agent workflows and their runs.
//!
//! The workflow model (`workflow`) mirrors the persisted agent format, so field names and
//! casing are load-bearing. The run model (`run`) describes what an execution reports back:
//! the streamed log and the final verdict.

pub mod run;
pub mod workflow;

pub use run::{BranchOutcome, BranchReport, LogEntry, LogSeverity, RunResult, StepOutputs, TriggerInput};
pub use workflow::{Agent, AgentStatus, StepKind, WorkflowStep};
