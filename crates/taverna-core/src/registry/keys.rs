//! Registry key catalog
//!
//! Service names and interface types are registered once at start-up and
//! handed to the locator through a [`RegistryConfig`]. Registration is
//! idempotent: asking for the same key again returns the existing entry.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::RegistryError;
use crate::domain::{InterfaceType, ServiceName};

/// Service name under which Taverna Servers are registered
pub const TAVERNA_SERVICE_NAME: &str = "taverna";

/// Interface type identifier of the Taverna Server SOAP API
pub const TAVERNA_SOAP_INTERFACE_ID: &str = "TAVERNA_SOAP";

pub const TAVERNA_SOAP_INTERFACE_URI: &str = "http://taverna/soap";

#[derive(Default)]
struct Entries {
    services: HashMap<String, ServiceName>,
    interfaces: HashMap<String, InterfaceType>,
}

/// Lock-guarded set of registered registry keys
#[derive(Default)]
pub struct KeyCatalog {
    entries: RwLock<Entries>,
}

impl KeyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service name, or return the one already registered.
    pub fn register_service_name(&self, name: &str, description: Option<&str>) -> ServiceName {
        if let Some(existing) = self.entries.read().services.get(name) {
            return existing.clone();
        }

        let mut entries = self.entries.write();
        entries
            .services
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(service = name, "Registered service name");
                ServiceName::new(name, description.map(str::to_string))
            })
            .clone()
    }

    /// Register an interface type, or return the one already registered.
    ///
    /// Fails when `id` is already registered with a different URI.
    pub fn register_interface_type(
        &self,
        id: &str,
        uri: &str,
    ) -> Result<InterfaceType, RegistryError> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.interfaces.get(id) {
            if existing.uri() != uri {
                return Err(RegistryError::ConflictingInterfaceType {
                    id: id.to_string(),
                    registered: existing.uri().to_string(),
                    requested: uri.to_string(),
                });
            }
            return Ok(existing.clone());
        }

        let interface_type = InterfaceType::new(id, uri);
        entries
            .interfaces
            .insert(id.to_string(), interface_type.clone());
        debug!(interface_type = id, uri, "Registered interface type");
        Ok(interface_type)
    }

    pub fn service_name(&self, name: &str) -> Option<ServiceName> {
        self.entries.read().services.get(name).cloned()
    }

    pub fn interface_type(&self, id: &str) -> Option<InterfaceType> {
        self.entries.read().interfaces.get(id).cloned()
    }

    /// Total number of distinct keys registered
    pub fn registration_count(&self) -> usize {
        let entries = self.entries.read();
        entries.services.len() + entries.interfaces.len()
    }
}

/// Registry keys the locator resolves against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    service: ServiceName,
    interface_type: InterfaceType,
}

impl RegistryConfig {
    pub fn new(service: ServiceName, interface_type: InterfaceType) -> Self {
        Self {
            service,
            interface_type,
        }
    }

    /// Register the Taverna Server keys in `catalog` and return them.
    pub fn register(catalog: &KeyCatalog) -> Result<Self, RegistryError> {
        let service = catalog.register_service_name(TAVERNA_SERVICE_NAME, None);
        let interface_type =
            catalog.register_interface_type(TAVERNA_SOAP_INTERFACE_ID, TAVERNA_SOAP_INTERFACE_URI)?;
        Ok(Self::new(service, interface_type))
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn interface_type(&self) -> &InterfaceType {
        &self.interface_type
    }
}
