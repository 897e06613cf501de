//! Error taxonomy for the Taverna client
//!
//! Callers must be able to tell apart "could not find or reach the server",
//! "the server refused this operation" and "the local input was invalid".
//! [`TavernaError::category`] exposes that split directly.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::WorkflowParseError;
use crate::registry::RegistryError;
use crate::transport::RemoteError;

/// Endpoint discovery failures
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(
        "no {interface_type} endpoint registered for service '{service}' ({candidates} candidate(s) examined)"
    )]
    NoMatchingEndpoint {
        service: String,
        interface_type: String,
        candidates: usize,
    },

    #[error("registry advertises an unusable endpoint '{url}' for service '{service}': {reason}")]
    InvalidEndpoint {
        service: String,
        url: String,
        reason: String,
    },

    #[error("registry lookup for service '{service}' failed: {source}")]
    Registry {
        service: String,
        #[source]
        source: RegistryError,
    },
}

/// Coarse classification of a [`TavernaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The server could not be found or reached
    Discovery,
    /// Caller-supplied input was invalid; nothing was sent
    LocalInput,
    /// The server refused the operation
    Refused,
    /// A remote call failed in transit or returned an unusable answer
    Remote,
}

/// Main error type for client operations
#[derive(Debug, Error)]
pub enum TavernaError {
    #[error("Endpoint resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Invalid service address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Malformed workflow document {origin}: {source}")]
    MalformedWorkflow {
        origin: String,
        #[source]
        source: WorkflowParseError,
    },

    #[error("Cannot read workflow from {}: {source}", .path.display())]
    WorkflowSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server refused to create the run: {message}")]
    RunCreationRejected { message: String },

    #[error("Server failed while building the run: {message}")]
    RunCreationFailed { message: String },

    #[error("Remote call {operation} failed: {source}")]
    RemoteCallFailed {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },
}

impl TavernaError {
    /// Create an invalid address error.
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure of a read-only remote query.
    pub fn remote(operation: &'static str, source: RemoteError) -> Self {
        Self::RemoteCallFailed { operation, source }
    }

    /// Map a failed create-run call, keeping the two server-reported
    /// refusal kinds apart.
    pub fn creation(source: RemoteError) -> Self {
        match source {
            RemoteError::NoCreate { message } => Self::RunCreationRejected { message },
            RemoteError::NoUpdate { message } => Self::RunCreationFailed { message },
            other => Self::remote("createRun", other),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TavernaError::Resolution(_) => ErrorCategory::Discovery,
            TavernaError::InvalidAddress { .. }
            | TavernaError::MalformedWorkflow { .. }
            | TavernaError::WorkflowSource { .. } => ErrorCategory::LocalInput,
            TavernaError::RunCreationRejected { .. } | TavernaError::RunCreationFailed { .. } => {
                ErrorCategory::Refused
            }
            TavernaError::RemoteCallFailed { .. } => ErrorCategory::Remote,
        }
    }
}
