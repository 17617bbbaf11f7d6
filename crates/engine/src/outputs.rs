//! Run-scoped store of step outputs.
//!
//! Each run owns exactly one [`StepOutputStore`]. Handles are cheap to clone and all point at
//! the same map, so concurrently running branches see the trigger output and their own earlier
//! steps. Writes are keyed by step id; ids are unique within a run, so branches only ever
//! perform disjoint writes.

use std::sync::{Arc, RwLock};

use agentflow_types::StepOutputs;
use serde_json::{Map as JsonMap, Value};

#[derive(Debug, Clone, Default)]
pub struct StepOutputStore {
    inner: Arc<RwLock<StepOutputs>>,
}

impl StepOutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outputs of `step_id`, replacing any earlier entry for the same id.
    pub fn record(&self, step_id: impl Into<String>, outputs: JsonMap<String, Value>) {
        self.inner
            .write()
            .expect("step output lock poisoned")
            .insert(step_id.into(), outputs);
    }

    /// Returns a copy of the outputs recorded for `step_id`.
    pub fn get(&self, step_id: &str) -> Option<JsonMap<String, Value>> {
        self.read(|outputs| outputs.get(step_id).cloned())
    }

    /// Returns a single named output of a step.
    pub fn output(&self, step_id: &str, output_name: &str) -> Option<Value> {
        self.read(|outputs| outputs.get(step_id).and_then(|values| values.get(output_name)).cloned())
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.read(|outputs| outputs.contains_key(step_id))
    }

    /// Runs `reader` against the current contents while holding the read lock.
    ///
    /// Keep the closure short and synchronous; writers wait until it returns.
    pub fn read<R>(&self, reader: impl FnOnce(&StepOutputs) -> R) -> R {
        let guard = self.inner.read().expect("step output lock poisoned");
        reader(&guard)
    }

    /// Copies the current contents.
    pub fn snapshot(&self) -> StepOutputs {
        self.read(|outputs| outputs.clone())
    }
}
