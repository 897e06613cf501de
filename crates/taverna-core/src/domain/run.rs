//! Run references
//!
//! A [`RunReference`] is the boundary to the run's own lifecycle (start,
//! status, listeners), which this crate does not manage. It only pairs the
//! server-issued identifier with the channel the run was created or listed
//! through.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::WorkflowDocument;
use crate::error::TavernaError;
use crate::transport::RunService;

/// Server-issued run identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RunId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Handle to a run on the server
#[derive(Clone)]
pub struct RunReference {
    id: RunId,
    channel: Arc<dyn RunService>,
}

impl RunReference {
    /// Attach to a run that already exists on the server.
    pub fn attach(channel: Arc<dyn RunService>, id: RunId) -> Self {
        Self { id, channel }
    }

    /// Create a run from a parsed workflow.
    ///
    /// Issues exactly one create-run call. The run comes back created but not
    /// started.
    pub async fn submit(
        channel: Arc<dyn RunService>,
        workflow: &WorkflowDocument,
    ) -> Result<Self, TavernaError> {
        let id = channel
            .create_run(workflow)
            .await
            .map_err(TavernaError::creation)?;

        info!(run_id = %id, "Created workflow run");
        Ok(Self::attach(channel, id))
    }

    pub fn id(&self) -> &RunId {
        &self.id
    }

    /// Channel the run is reachable through
    pub fn channel(&self) -> &Arc<dyn RunService> {
        &self.channel
    }

    pub fn same_run(&self, other: &RunReference) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for RunReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunReference").field("id", &self.id).finish()
    }
}
