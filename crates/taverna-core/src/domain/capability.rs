//! Server capability metadata

use chrono::{DateTime, Utc};

use crate::domain::WorkflowDocument;

/// Workflows the server allows runs to be created from.
///
/// An empty list means every workflow is permitted. A non-empty list is the
/// complete allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermittedWorkflows(Vec<WorkflowDocument>);

impl PermittedWorkflows {
    pub fn new(workflows: Vec<WorkflowDocument>) -> Self {
        Self(workflows)
    }

    /// True when the server places no restriction on workflows.
    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a run may be created from `workflow`.
    pub fn permits(&self, workflow: &WorkflowDocument) -> bool {
        self.is_unrestricted() || self.0.iter().any(|allowed| allowed.same_workflow(workflow))
    }

    pub fn as_slice(&self) -> &[WorkflowDocument] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_documents(self) -> Vec<WorkflowDocument> {
        self.0
    }
}

impl From<Vec<WorkflowDocument>> for PermittedWorkflows {
    fn from(workflows: Vec<WorkflowDocument>) -> Self {
        Self(workflows)
    }
}

/// Point-in-time bundle of server metadata
#[derive(Debug, Clone)]
pub struct CapabilitySnapshot {
    /// URI schemes usable for run notifications
    pub notifier_protocols: Vec<String>,

    /// Per-user run limit. A stricter global limit may still apply server-side
    /// and cannot be discovered through this value.
    pub max_runs: u32,

    /// Listener types that may be attached to a run. Empty when no runs exist yet.
    pub listener_types: Vec<String>,

    pub permitted_workflows: PermittedWorkflows,

    pub captured_at: DateTime<Utc>,
}
