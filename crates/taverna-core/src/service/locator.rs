//! Service locator - finds a Taverna Server through the registry

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{SecurityToken, ServiceEndpoint};
use crate::error::{ResolutionError, TavernaError};
use crate::registry::{EndpointFilter, KeyCatalog, RegistryConfig, RegistryError, ServiceRegistry};
use crate::service::connection::check_server_url;
use crate::service::{ConnectionConfig, ServerConnection};
use crate::transport::ChannelFactory;

/// Resolves the Taverna service through a registry and opens connections to it
pub struct ServiceLocator {
    registry: Arc<dyn ServiceRegistry>,
    config: RegistryConfig,
    channels: Arc<dyn ChannelFactory>,
}

impl ServiceLocator {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        config: RegistryConfig,
        channels: Arc<dyn ChannelFactory>,
    ) -> Self {
        Self {
            registry,
            config,
            channels,
        }
    }

    /// Register the Taverna keys in `catalog` (idempotent) and build a locator for them.
    pub fn with_catalog(
        registry: Arc<dyn ServiceRegistry>,
        catalog: &KeyCatalog,
        channels: Arc<dyn ChannelFactory>,
    ) -> Result<Self, RegistryError> {
        let config = RegistryConfig::register(catalog)?;
        Ok(Self::new(registry, config, channels))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Look up the first advertised endpoint of the expected interface type.
    ///
    /// Single pass over the registry's list, first match wins, no retry. A
    /// winning endpoint with a non-http(s) or host-less URL is a registry
    /// misconfiguration, not a reason to try the next one.
    pub async fn resolve_endpoint(&self) -> Result<ServiceEndpoint, ResolutionError> {
        let service = self.config.service();
        let wanted = self.config.interface_type();
        let registry_failure = |source| ResolutionError::Registry {
            service: service.to_string(),
            source,
        };

        let descriptor = self
            .registry
            .service_descriptor(service)
            .await
            .map_err(registry_failure)?;
        let endpoints = self
            .registry
            .all_endpoints(&descriptor, &EndpointFilter::any())
            .await
            .map_err(registry_failure)?;

        debug!(
            service = %service,
            candidates = endpoints.len(),
            "Registry returned endpoints"
        );

        let candidates = endpoints.len();
        match endpoints
            .into_iter()
            .find(|endpoint| wanted.matches(endpoint.interface_type()))
        {
            Some(endpoint) => {
                if let Err(reason) = check_server_url(endpoint.url()) {
                    warn!(
                        service = %service,
                        endpoint = %endpoint.url(),
                        reason = %reason,
                        "Registry advertised an unusable endpoint"
                    );
                    return Err(ResolutionError::InvalidEndpoint {
                        service: service.to_string(),
                        url: endpoint.url().to_string(),
                        reason,
                    });
                }
                info!(
                    service = %service,
                    interface_type = %wanted,
                    endpoint = %endpoint.url(),
                    "Resolved service endpoint"
                );
                Ok(endpoint)
            }
            None => {
                warn!(
                    service = %service,
                    interface_type = %wanted,
                    candidates,
                    "No matching endpoint in registry"
                );
                Err(ResolutionError::NoMatchingEndpoint {
                    service: service.to_string(),
                    interface_type: wanted.to_string(),
                    candidates,
                })
            }
        }
    }

    /// Resolve the service and open a token-authenticated connection to it.
    pub async fn resolve(
        &self,
        token: impl Into<SecurityToken>,
    ) -> Result<ServerConnection, TavernaError> {
        let endpoint = self.resolve_endpoint().await?;
        ServerConnection::open(
            ConnectionConfig::with_token(endpoint.url().as_str(), token),
            self.channels.as_ref(),
        )
    }
}
