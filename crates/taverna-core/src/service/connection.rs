//! Server connection - authenticated session against one Taverna Server
//!
//! A connection is bound to exactly one endpoint with one credential
//! strategy for its whole life. Opening it never touches the network; every
//! operation afterwards is a single remote call on the bound channel
//! (`capabilities` issues four in sequence).

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{
    CapabilitySnapshot, Credentials, PermittedWorkflows, RunId, RunReference, SecurityToken,
    WorkflowSource,
};
use crate::error::TavernaError;
use crate::transport::{ChannelFactory, ChannelProperties, RemoteError, RunService};

/// Address used when no explicit server address is given
pub const DEFAULT_SERVER_ADDRESS: &str = "http://localhost:8080/taverna-server/soap/";

/// How to open a [`ServerConnection`]
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Explicit server address; `None` targets [`DEFAULT_SERVER_ADDRESS`]
    pub address: Option<String>,
    pub credentials: Credentials,
}

impl ConnectionConfig {
    /// Default address, anonymous access
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Explicit address, anonymous access
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            credentials: Credentials::None,
        }
    }

    /// Explicit address, HELIO security token
    pub fn with_token(address: impl Into<String>, token: impl Into<SecurityToken>) -> Self {
        Self {
            address: Some(address.into()),
            credentials: Credentials::token(token),
        }
    }

    /// Explicit address, username and password
    pub fn with_login(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: Some(address.into()),
            credentials: Credentials::login(username, password),
        }
    }

    /// Default address, username and password
    pub fn default_login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: None,
            credentials: Credentials::login(username, password),
        }
    }
}

/// Parse a caller-supplied server address.
///
/// Accepts absolute `http`/`https` URLs with a host.
pub fn parse_server_address(address: &str) -> Result<Url, TavernaError> {
    let url = Url::parse(address.trim())
        .map_err(|e| TavernaError::invalid_address(address, e.to_string()))?;

    if let Err(reason) = check_server_url(&url) {
        return Err(TavernaError::invalid_address(address, reason));
    }
    Ok(url)
}

/// Reject URLs a SOAP channel cannot talk to: non-http(s) schemes and missing hosts.
pub(crate) fn check_server_url(url: &Url) -> Result<(), String> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}

/// Session with a Taverna Server
pub struct ServerConnection {
    endpoint: Url,
    credentials: Credentials,
    properties: ChannelProperties,
    channel: Arc<dyn RunService>,
}

impl ServerConnection {
    /// Bind a channel for `config` through `channels`.
    ///
    /// Fails only on a malformed address. No network I/O happens here.
    pub fn open(config: ConnectionConfig, channels: &dyn ChannelFactory) -> Result<Self, TavernaError> {
        let explicit = config
            .address
            .as_deref()
            .map(parse_server_address)
            .transpose()?;
        let endpoint = match &explicit {
            Some(url) => url.clone(),
            None => parse_server_address(DEFAULT_SERVER_ADDRESS)?,
        };

        let properties = ChannelProperties::for_strategy(explicit.as_ref(), &config.credentials);
        let channel = channels.bind(&endpoint, &properties);

        debug!(
            endpoint = %endpoint,
            strategy = config.credentials.strategy(),
            properties = properties.len(),
            "Bound run-service channel"
        );

        Ok(Self {
            endpoint,
            credentials: config.credentials,
            properties,
            channel,
        })
    }

    /// URL the channel targets
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Identity properties attached to the channel
    pub fn properties(&self) -> &ChannelProperties {
        &self.properties
    }

    pub fn channel(&self) -> &Arc<dyn RunService> {
        &self.channel
    }

    /// Reference an existing run by id on this connection. No remote call.
    pub fn run(&self, id: impl Into<RunId>) -> RunReference {
        RunReference::attach(self.channel.clone(), id.into())
    }

    /// Create a run from a workflow.
    ///
    /// File and text sources are read and parsed before anything is sent; a
    /// bad source never reaches the server. The returned run is created but
    /// not started.
    pub async fn create_run(
        &self,
        workflow: impl Into<WorkflowSource>,
    ) -> Result<RunReference, TavernaError> {
        let workflow = workflow.into().load().await?;
        debug!(endpoint = %self.endpoint, root = workflow.root_name(), "Submitting workflow");

        match RunReference::submit(self.channel.clone(), &workflow).await {
            Ok(run) => Ok(run),
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Run creation failed");
                Err(e)
            }
        }
    }

    /// Runs visible to this connection's identity, in server order
    pub async fn list_runs(&self) -> Result<Vec<RunReference>, TavernaError> {
        let ids = self
            .channel
            .list_runs()
            .await
            .map_err(|e| self.remote_failure("listRuns", e))?;

        debug!(endpoint = %self.endpoint, count = ids.len(), "Listed runs");
        Ok(ids
            .into_iter()
            .map(|id| RunReference::attach(self.channel.clone(), id))
            .collect())
    }

    /// URI schemes the server can deliver run notifications over
    pub async fn notifier_protocols(&self) -> Result<Vec<String>, TavernaError> {
        self.channel
            .enabled_notification_fabrics()
            .await
            .map_err(|e| self.remote_failure("getEnabledNotificationFabrics", e))
    }

    /// Per-user limit on simultaneous runs.
    ///
    /// A stricter server-wide limit may apply and is not reported here.
    pub async fn max_runs(&self) -> Result<u32, TavernaError> {
        self.channel
            .max_simultaneous_runs()
            .await
            .map_err(|e| self.remote_failure("getMaxSimultaneousRuns", e))
    }

    /// Listener types that may be attached to a run.
    ///
    /// Empty is a valid answer when no runs exist yet.
    pub async fn listener_types(&self) -> Result<Vec<String>, TavernaError> {
        self.channel
            .permitted_listener_types()
            .await
            .map_err(|e| self.remote_failure("getPermittedListenerTypes", e))
    }

    /// Allow-list of workflows; an empty list means any workflow is accepted.
    pub async fn permitted_workflows(&self) -> Result<PermittedWorkflows, TavernaError> {
        self.channel
            .permitted_workflows()
            .await
            .map(PermittedWorkflows::new)
            .map_err(|e| self.remote_failure("getPermittedWorkflows", e))
    }

    /// Query all capability metadata, one call after another.
    pub async fn capabilities(&self) -> Result<CapabilitySnapshot, TavernaError> {
        let notifier_protocols = self.notifier_protocols().await?;
        let max_runs = self.max_runs().await?;
        let listener_types = self.listener_types().await?;
        let permitted_workflows = self.permitted_workflows().await?;

        info!(
            endpoint = %self.endpoint,
            max_runs,
            permitted_workflows = permitted_workflows.len(),
            "Captured server capabilities"
        );

        Ok(CapabilitySnapshot {
            notifier_protocols,
            max_runs,
            listener_types,
            permitted_workflows,
            captured_at: Utc::now(),
        })
    }

    fn remote_failure(&self, operation: &'static str, error: RemoteError) -> TavernaError {
        warn!(endpoint = %self.endpoint, operation, error = %error, "Remote call failed");
        TavernaError::remote(operation, error)
    }
}

impl fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConnection")
            .field("endpoint", &self.endpoint.as_str())
            .field("credentials", &self.credentials)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
