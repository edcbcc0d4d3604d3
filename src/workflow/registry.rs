use std::collections::BTreeMap;

use super::WorkflowDescriptor;
use crate::error::{ErrorCode, LabflowError, Result};

/// Workflow templates keyed by name.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    workflows: BTreeMap<String, WorkflowDescriptor>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the descriptor's name. Names are unique.
    pub fn register(&mut self, workflow: WorkflowDescriptor) -> Result<()> {
        let name = workflow.name().to_string();
        if self.workflows.contains_key(&name) {
            return Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("Workflow '{}' is already registered", name),
            ));
        }
        self.workflows.insert(name, workflow);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&WorkflowDescriptor> {
        self.workflows.get(name).ok_or_else(|| {
            LabflowError::not_found(
                ErrorCode::NOT_FOUND_WORKFLOW,
                format!("No workflow registered as '{}'", name),
            )
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workflows.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}
