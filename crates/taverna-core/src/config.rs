//! Client configuration
//!
//! Values come from an optional JSON file, then environment variables
//! override them field by field.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::Credentials;
use crate::service::ConnectionConfig;

pub const ENV_SERVER_URL: &str = "TAVERNA_SERVER_URL";
pub const ENV_USERNAME: &str = "TAVERNA_USERNAME";
pub const ENV_PASSWORD: &str = "TAVERNA_PASSWORD";
pub const ENV_SECURITY_TOKEN: &str = "HELIO_SECURITY_TOKEN";
pub const ENV_REGISTRY_URL: &str = "HELIO_REGISTRY_URL";
pub const ENV_TIMEOUT_SECS: &str = "TAVERNA_TIMEOUT_SECS";

/// Remote call timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    #[error("Both username/password and a security token are configured; choose one")]
    ConflictingCredentials,

    #[error("Username '{username}' is configured without a password")]
    MissingPassword { username: String },

    #[error("A password is configured without a username")]
    MissingUsername,
}

/// Client settings
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit server address; unset means the default address
    pub server_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security_token: Option<String>,
    /// Base URL of the service registry, for discovery
    pub registry_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Loaded client config");
        Ok(config)
    }

    /// Settings from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from process environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Override fields from a variable lookup. Empty values count as unset.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = var(ENV_SERVER_URL) {
            self.server_address = Some(value);
        }
        if let Some(value) = var(ENV_USERNAME) {
            self.username = Some(value);
        }
        if let Some(value) = var(ENV_PASSWORD) {
            self.password = Some(value);
        }
        if let Some(value) = var(ENV_SECURITY_TOKEN) {
            self.security_token = Some(value);
        }
        if let Some(value) = var(ENV_REGISTRY_URL) {
            self.registry_url = Some(value);
        }
        if let Some(value) = var(ENV_TIMEOUT_SECS) {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: ENV_TIMEOUT_SECS.to_string(),
                    message: e.to_string(),
                })?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Credential strategy implied by the configured secrets.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        match (&self.username, &self.password, &self.security_token) {
            (Some(_), _, Some(_)) | (None, Some(_), Some(_)) => {
                Err(ConfigError::ConflictingCredentials)
            }
            (Some(username), Some(password), None) => {
                Ok(Credentials::login(username.clone(), password.clone()))
            }
            (Some(username), None, None) => Err(ConfigError::MissingPassword {
                username: username.clone(),
            }),
            (None, Some(_), None) => Err(ConfigError::MissingUsername),
            (None, None, Some(token)) => Ok(Credentials::token(token.as_str())),
            (None, None, None) => Ok(Credentials::None),
        }
    }

    /// Connection settings for [`crate::ServerConnection::open`].
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        Ok(ConnectionConfig {
            address: self.server_address.clone(),
            credentials: self.credentials()?,
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("server_address", &self.server_address)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("security_token", &redact(&self.security_token))
            .field("registry_url", &self.registry_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
