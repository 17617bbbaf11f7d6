//! Run lifecycle tracking.

use std::fmt;

use tracing::debug;

/// Phase of a single run. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    TriggerFired,
    BranchesRunning,
    Completed { success: bool },
}

impl RunPhase {
    fn rank(self) -> u8 {
        match self {
            RunPhase::NotStarted => 0,
            RunPhase::TriggerFired => 1,
            RunPhase::BranchesRunning => 2,
            RunPhase::Completed { .. } => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Completed { .. })
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::NotStarted => f.write_str("not_started"),
            RunPhase::TriggerFired => f.write_str("trigger_fired"),
            RunPhase::BranchesRunning => f.write_str("branches_running"),
            RunPhase::Completed { success: true } => f.write_str("completed(success)"),
            RunPhase::Completed { success: false } => f.write_str("completed(failure)"),
        }
    }
}

/// Tracks the phase of one run and traces every transition.
#[derive(Debug)]
pub(crate) struct RunState {
    phase: RunPhase,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self { phase: RunPhase::NotStarted }
    }

    pub(crate) fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Moves to `next`. Backward or repeated transitions are ignored.
    pub(crate) fn advance(&mut self, next: RunPhase) {
        if self.phase.is_terminal() || next.rank() <= self.phase.rank() {
            debug!(from = %self.phase, to = %next, "ignoring out-of-order run phase transition");
            return;
        }
        debug!(from = %self.phase, to = %next, "run phase changed");
        self.phase = next;
    }
}
