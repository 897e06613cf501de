//! Registry keys and resolved service endpoints

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Logical service name registered in the key catalog (e.g. `taverna`).
///
/// Instances are only handed out by [`crate::registry::KeyCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName {
    name: String,
    description: Option<String>,
}

impl ServiceName {
    pub(crate) fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Transport/protocol tag used to filter registry endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceType {
    id: String,
    uri: String,
}

impl InterfaceType {
    pub(crate) fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// True when a registry-advertised interface identifier names this type.
    pub fn matches(&self, advertised: &str) -> bool {
        self.id == advertised
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Service descriptor returned by the registry for a service key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
        }
    }
}

/// Resolved network address for a logical service.
///
/// Immutable; the locator produces a fresh value on every lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    url: Url,
    interface_type: String,
}

impl ServiceEndpoint {
    pub fn new(url: Url, interface_type: impl Into<String>) -> Self {
        Self {
            url,
            interface_type: interface_type.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn interface_type(&self) -> &str {
        &self.interface_type
    }
}
