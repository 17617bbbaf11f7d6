//! Run orchestration for agent workflows.
//!
//! - `trigger` builds the payload the trigger seeds into the output store
//! - `state` tracks the run lifecycle
//! - `runner::WorkflowEngine` is the public entry point

pub mod runner;
pub mod state;
pub mod trigger;

pub use runner::WorkflowEngine;
pub use state::RunPhase;
pub use trigger::{default_payload, trigger_payload};
