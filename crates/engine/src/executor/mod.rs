//! Step execution: dispatches resolved steps and runs branches of them in order.
//!
//! - `operation` maps an `(integration, operation)` pair to the behavior it gets
//! - `dispatcher::StepDispatcher` abstracts how a single step is performed
//! - `dispatcher::OperationDispatcher` is the default, backed by the text generator and agent store
//! - `branch::run_branch` walks one branch, recording outputs into the run's store as it goes

pub mod branch;
pub mod confirmation;
pub mod dispatcher;
pub mod filter;
pub mod operation;
pub mod types;

pub use branch::{BranchContext, run_branch};
pub use confirmation::confirmation_message;
pub use dispatcher::{DEFAULT_PROMPT, OperationDispatcher, StepDispatcher};
pub use filter::{FilterCondition, UnknownCondition};
pub use operation::Operation;
pub use types::{StepOutcome, StepSuccess};
