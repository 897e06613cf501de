//! Subcommand implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use serde_json::json;
use taverna_core::{
    ClientConfig, HttpRegistryClient, KeyCatalog, SecurityToken, ServerConnection, ServiceLocator,
    TavernaError,
};
use taverna_soap::{SoapChannelFactory, SoapConfig};
use tracing::info;

/// Settings shared by every subcommand
pub struct Context {
    pub config: ClientConfig,
    pub discover: bool,
    pub json: bool,
}

/// Build the effective configuration: file, then environment, then `--server`.
pub fn load_config(path: Option<&Path>, server: Option<&str>) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid configuration in environment")?;
    if let Some(server) = server {
        config.server_address = Some(server.to_string());
    }
    Ok(config)
}

fn channel_factory(config: &ClientConfig) -> Result<Arc<SoapChannelFactory>> {
    let soap = SoapConfig {
        timeout: config.timeout(),
        ..SoapConfig::default()
    };
    Ok(Arc::new(
        SoapChannelFactory::new(soap).context("Failed to create SOAP client")?,
    ))
}

fn locator(config: &ClientConfig, channels: Arc<SoapChannelFactory>) -> Result<ServiceLocator> {
    let registry_url = config
        .registry_url
        .as_deref()
        .context("Discovery needs a registry URL (registry_url or HELIO_REGISTRY_URL)")?;
    let registry = HttpRegistryClient::with_timeout(registry_url, config.timeout())
        .context("Failed to create registry client")?;

    let catalog = KeyCatalog::new();
    ServiceLocator::with_catalog(Arc::new(registry), &catalog, channels)
        .context("Failed to register registry keys")
}

/// Discovery picks the address and always authenticates with a token.
fn check_discovery(config: &ClientConfig) -> Result<()> {
    if config.username.is_some() || config.password.is_some() {
        bail!("--discover authenticates with a security token; remove the username/password");
    }
    if let Some(address) = config.server_address.as_deref() {
        bail!(
            "--discover takes the server address from the registry; remove --server/server_address ({})",
            address
        );
    }
    Ok(())
}

async fn connect(ctx: &Context) -> Result<ServerConnection> {
    let channels = channel_factory(&ctx.config)?;

    if ctx.discover {
        check_discovery(&ctx.config)?;
        let token = SecurityToken::from(ctx.config.security_token.clone());
        let connection = locator(&ctx.config, channels)?
            .resolve(token)
            .await
            .context("Failed to locate Taverna Server")?;
        return Ok(connection);
    }

    let config = ctx.config.connection_config()?;
    Ok(ServerConnection::open(config, channels.as_ref())?)
}

/// Print the server's capability snapshot.
pub async fn info(ctx: &Context) -> Result<()> {
    let connection = connect(ctx).await?;
    let snapshot = connection.capabilities().await?;

    if ctx.json {
        let permitted: Vec<&str> = snapshot
            .permitted_workflows
            .as_slice()
            .iter()
            .map(|workflow| workflow.xml())
            .collect();
        let out = json!({
            "endpoint": connection.endpoint().as_str(),
            "notifier_protocols": snapshot.notifier_protocols,
            "max_runs": snapshot.max_runs,
            "listener_types": snapshot.listener_types,
            "permitted_workflows": permitted,
            "captured_at": snapshot.captured_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Server:              {}", connection.endpoint());
    println!("Max runs (per user): {}", snapshot.max_runs);
    println!("Notifier protocols:  {}", join_or_none(&snapshot.notifier_protocols));
    println!("Listener types:      {}", join_or_none(&snapshot.listener_types));
    if snapshot.permitted_workflows.is_unrestricted() {
        println!("Permitted workflows: any");
    } else {
        println!(
            "Permitted workflows: {} listed",
            snapshot.permitted_workflows.len()
        );
    }
    Ok(())
}

/// List run ids visible to the configured identity.
pub async fn runs(ctx: &Context) -> Result<()> {
    let connection = connect(ctx).await?;
    let runs = connection.list_runs().await?;

    if ctx.json {
        let ids: Vec<&str> = runs.iter().map(|run| run.id().as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "runs": ids }))?);
    } else {
        for run in &runs {
            println!("{}", run.id());
        }
    }
    Ok(())
}

/// Create a run from a workflow file; the run is not started.
pub async fn submit(ctx: &Context, file: PathBuf) -> Result<()> {
    let connection = connect(ctx).await?;
    let run = connection.create_run(file).await?;
    info!(run_id = %run.id(), "Run created (not started)");

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "run_id": run.id(),
                "endpoint": connection.endpoint().as_str(),
            }))?
        );
    } else {
        println!("{}", run.id());
    }
    Ok(())
}

/// Resolve the Taverna Server endpoint through the registry.
pub async fn resolve(ctx: &Context) -> Result<()> {
    let locator = locator(&ctx.config, channel_factory(&ctx.config)?)?;
    let endpoint = locator
        .resolve_endpoint()
        .await
        .map_err(TavernaError::from)
        .context("Failed to locate Taverna Server")?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&endpoint)?);
    } else {
        println!("{} ({})", endpoint.url(), endpoint.interface_type());
    }
    Ok(())
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}
