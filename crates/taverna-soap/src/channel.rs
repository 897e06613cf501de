//! SOAP run-service channel
//!
//! Channel properties map onto HTTP: `EndpointAddress` is the request URL,
//! `Username`/`Password` become Basic auth, `HttpRequestHeaders` are appended
//! to every request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use taverna_core::{ChannelFactory, ChannelProperties, RemoteError, RunId, RunService, WorkflowDocument};
use tracing::{debug, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::envelope::{self, Operation};
use crate::response::{self, ReturnValue, SoapResponse};

/// HTTP settings shared by every channel a factory binds
#[derive(Debug, Clone)]
pub struct SoapConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SoapConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: concat!("taverna-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Binds [`SoapChannel`]s sharing one HTTP client
#[derive(Clone)]
pub struct SoapChannelFactory {
    client: reqwest::Client,
}

impl SoapChannelFactory {
    pub fn new(config: SoapConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| RemoteError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl ChannelFactory for SoapChannelFactory {
    fn bind(&self, endpoint: &Url, properties: &ChannelProperties) -> Arc<dyn RunService> {
        Arc::new(SoapChannel::new(self.client.clone(), endpoint, properties))
    }
}

/// [`RunService`] speaking SOAP to one Taverna Server endpoint
pub struct SoapChannel {
    client: reqwest::Client,
    url: Url,
    headers: Result<HeaderMap, RemoteError>,
    basic_auth: Option<(String, Zeroizing<String>)>,
}

impl SoapChannel {
    pub fn new(client: reqwest::Client, endpoint: &Url, properties: &ChannelProperties) -> Self {
        let url = properties.endpoint_address().unwrap_or(endpoint).clone();
        let basic_auth = properties.username().map(|username| {
            (
                username.to_string(),
                Zeroizing::new(properties.password().unwrap_or_default().to_string()),
            )
        });

        Self {
            client,
            url,
            headers: request_headers(properties),
            basic_auth,
        }
    }

    /// Request URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call(
        &self,
        operation: Operation,
        workflow: Option<&WorkflowDocument>,
    ) -> Result<Vec<ReturnValue>, RemoteError> {
        let headers = self.headers.clone()?;
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .headers(headers)
            .body(envelope::request(operation, workflow));
        if let Some((username, password)) = &self.basic_auth {
            request = request.basic_auth(username, Some(password.as_str()));
        }

        debug!(endpoint = %self.url, operation = operation.name(), "Sending SOAP request");

        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                RemoteError::timeout(operation.name())
            } else {
                RemoteError::transport(e.to_string())
            }
        };
        let response = request.send().await.map_err(failed)?;
        let status = response.status();
        let body = response.text().await.map_err(failed)?;

        match response::parse(&body) {
            Ok(SoapResponse::Fault(fault)) => {
                warn!(
                    endpoint = %self.url,
                    operation = operation.name(),
                    code = %fault.code,
                    message = %fault.message,
                    "SOAP fault"
                );
                Err(fault.into_remote_error())
            }
            _ if !status.is_success() => Err(RemoteError::Http {
                status: status.as_u16(),
            }),
            Ok(SoapResponse::Returns(values)) => {
                debug!(
                    operation = operation.name(),
                    returns = values.len(),
                    "SOAP call completed"
                );
                Ok(values)
            }
            Err(e) => Err(e),
        }
    }
}

fn request_headers(properties: &ChannelProperties) -> Result<HeaderMap, RemoteError> {
    let mut map = HeaderMap::new();
    let Some(headers) = properties.request_headers() else {
        return Ok(map);
    };

    for (name, values) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RemoteError::transport(format!("invalid header name '{name}': {e}")))?;
        for value in values {
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                RemoteError::transport(format!("invalid value for header '{name}': {e}"))
            })?;
            map.append(header_name.clone(), header_value);
        }
    }
    Ok(map)
}

fn texts(values: Vec<ReturnValue>) -> Vec<String> {
    values.into_iter().map(|value| value.text).collect()
}

fn single(operation: Operation, values: Vec<ReturnValue>) -> Result<String, RemoteError> {
    values
        .into_iter()
        .next()
        .map(|value| value.text)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| RemoteError::invalid_response(format!("{operation} returned no value")))
}

#[async_trait]
impl RunService for SoapChannel {
    async fn create_run(&self, workflow: &WorkflowDocument) -> Result<RunId, RemoteError> {
        let values = self.call(Operation::SubmitWorkflow, Some(workflow)).await?;
        single(Operation::SubmitWorkflow, values).map(RunId::from)
    }

    async fn list_runs(&self) -> Result<Vec<RunId>, RemoteError> {
        let values = self.call(Operation::ListRuns, None).await?;
        Ok(texts(values).into_iter().map(RunId::from).collect())
    }

    async fn enabled_notification_fabrics(&self) -> Result<Vec<String>, RemoteError> {
        let values = self.call(Operation::GetEnabledNotificationFabrics, None).await?;
        Ok(texts(values))
    }

    async fn max_simultaneous_runs(&self) -> Result<u32, RemoteError> {
        let values = self.call(Operation::GetMaxSimultaneousRuns, None).await?;
        let text = single(Operation::GetMaxSimultaneousRuns, values)?;
        text.parse::<u32>().map_err(|e| {
            RemoteError::invalid_response(format!("getMaxSimultaneousRuns returned '{text}': {e}"))
        })
    }

    async fn permitted_listener_types(&self) -> Result<Vec<String>, RemoteError> {
        let values = self.call(Operation::GetPermittedListenerTypes, None).await?;
        Ok(texts(values))
    }

    async fn permitted_workflows(&self) -> Result<Vec<WorkflowDocument>, RemoteError> {
        let values = self.call(Operation::GetPermittedWorkflows, None).await?;
        values
            .into_iter()
            .map(|value| {
                let element = value.element.ok_or_else(|| {
                    RemoteError::invalid_response("permitted workflow entry has no element")
                })?;
                WorkflowDocument::parse(&element).map_err(|e| {
                    RemoteError::invalid_response(format!("permitted workflow is malformed: {e}"))
                })
            })
            .collect()
    }
}
