//! Transport abstraction for the run service
//!
//! [`RunService`] is the capability set the core needs from a server
//! (create, list, metadata queries). Each wire protocol provides one
//! implementation and a [`ChannelFactory`] that binds it to an endpoint; the
//! core never sees the wire format, and tests substitute in-memory doubles.

mod properties;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::{RunId, WorkflowDocument};

pub use properties::{ChannelProperties, PropertyKey, PropertyValue, SECURITY_TOKEN_HEADER};

/// Failure reported by a channel for a single remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The server will not create the run (quota, forbidden workflow, ...)
    #[error("server will not create the run: {message}")]
    NoCreate { message: String },

    /// The server failed while writing the new run's state
    #[error("server could not update the run: {message}")]
    NoUpdate { message: String },

    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("{operation} timed out")]
    Timeout { operation: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl RemoteError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Remote run-service capability
///
/// Every method is exactly one remote call.
#[async_trait]
pub trait RunService: Send + Sync {
    /// Submit a workflow; returns the new run's identifier. The run is not started.
    async fn create_run(&self, workflow: &WorkflowDocument) -> Result<RunId, RemoteError>;

    /// Runs visible to the channel's identity, in server order
    async fn list_runs(&self) -> Result<Vec<RunId>, RemoteError>;

    /// URI schemes usable for notifications
    async fn enabled_notification_fabrics(&self) -> Result<Vec<String>, RemoteError>;

    /// Per-user limit on simultaneous runs
    async fn max_simultaneous_runs(&self) -> Result<u32, RemoteError>;

    async fn permitted_listener_types(&self) -> Result<Vec<String>, RemoteError>;

    /// Allow-list of workflows; empty means unrestricted
    async fn permitted_workflows(&self) -> Result<Vec<WorkflowDocument>, RemoteError>;
}

/// Binds run-service channels to endpoints
pub trait ChannelFactory: Send + Sync {
    /// Bind a channel targeting `endpoint` and carrying `properties` on every call.
    ///
    /// Must not perform network I/O.
    fn bind(&self, endpoint: &Url, properties: &ChannelProperties) -> Arc<dyn RunService>;
}
