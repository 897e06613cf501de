//! HTTP client for the HELIO service registry
//!
//! The registry serves JSON wrapped in a `{ "data": ... }` envelope:
//!
//! - `GET {base}/services/{name}` returns the service descriptor
//! - `GET {base}/services/{name}/endpoints` returns the advertised endpoints,
//!   optionally narrowed by `capability` and `interface_type` query parameters

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{ServiceDescriptor, ServiceEndpoint, ServiceName};
use crate::registry::{EndpointFilter, RegistryError, ServiceRegistry};

/// Response wrapper from the registry API
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
    #[allow(dead_code)]
    meta: Option<serde_json::Value>,
}

/// [`ServiceRegistry`] backed by the registry's HTTP API
pub struct HttpRegistryClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRegistryClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taverna-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn service_url(&self, name: &str) -> String {
        format!("{}/services/{}", self.base_url, urlencoding::encode(name))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        service: &str,
    ) -> Result<T, RegistryError> {
        debug!(url, "Querying service registry");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| RegistryError::unreachable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::UnknownService {
                service: service.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RegistryError::Http {
                status: status.as_u16(),
            });
        }

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| RegistryError::invalid_response(e.to_string()))?;
        Ok(body.data)
    }
}

#[async_trait]
impl ServiceRegistry for HttpRegistryClient {
    async fn service_descriptor(
        &self,
        name: &ServiceName,
    ) -> Result<ServiceDescriptor, RegistryError> {
        let url = self.service_url(name.as_str());
        let descriptor: ServiceDescriptor = self.fetch(&url, &[], name.as_str()).await?;

        info!(service = %name, "Fetched service descriptor");
        Ok(descriptor)
    }

    async fn all_endpoints(
        &self,
        descriptor: &ServiceDescriptor,
        filter: &EndpointFilter,
    ) -> Result<Vec<ServiceEndpoint>, RegistryError> {
        let url = format!("{}/endpoints", self.service_url(&descriptor.name));

        let mut query = Vec::new();
        if let Some(capability) = filter.capability.as_deref() {
            query.push(("capability", capability));
        }
        if let Some(interface_type) = filter.interface_type.as_deref() {
            query.push(("interface_type", interface_type));
        }

        let endpoints: Vec<ServiceEndpoint> = self.fetch(&url, &query, &descriptor.name).await?;
        debug!(service = %descriptor.name, count = endpoints.len(), "Fetched service endpoints");
        Ok(endpoints)
    }
}
