//! Service registry abstraction
//!
//! The registry maps a logical service name to a descriptor and the
//! descriptor to the endpoints currently advertised for it. Lookups are
//! keyed by names held in an explicit [`KeyCatalog`].

mod keys;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ServiceDescriptor, ServiceEndpoint, ServiceName};

pub use keys::{
    KeyCatalog, RegistryConfig, TAVERNA_SERVICE_NAME, TAVERNA_SOAP_INTERFACE_ID,
    TAVERNA_SOAP_INTERFACE_URI,
};

/// Registry failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry unreachable: {message}")]
    Unreachable { message: String },

    #[error("service '{service}' is not known to the registry")]
    UnknownService { service: String },

    #[error("registry returned HTTP status {status}")]
    Http { status: u16 },

    #[error("invalid registry response: {message}")]
    InvalidResponse { message: String },

    #[error("interface type '{id}' already registered as {registered}, not {requested}")]
    ConflictingInterfaceType {
        id: String,
        registered: String,
        requested: String,
    },
}

impl RegistryError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Optional narrowing of an endpoint listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointFilter {
    pub capability: Option<String>,
    pub interface_type: Option<String>,
}

impl EndpointFilter {
    /// No filtering; every advertised endpoint is returned.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_interface_type(mut self, interface_type: impl Into<String>) -> Self {
        self.interface_type = Some(interface_type.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.capability.is_none() && self.interface_type.is_none()
    }
}

/// Service registry client trait
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Look up the descriptor registered for a service name.
    async fn service_descriptor(&self, name: &ServiceName)
        -> Result<ServiceDescriptor, RegistryError>;

    /// All endpoints advertised for a descriptor, in registry order.
    async fn all_endpoints(
        &self,
        descriptor: &ServiceDescriptor,
        filter: &EndpointFilter,
    ) -> Result<Vec<ServiceEndpoint>, RegistryError>;
}
