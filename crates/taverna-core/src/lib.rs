//! # Taverna Core Library
//!
//! Client-side façade over a remote Taverna Server.
//!
//! ## Modules
//!
//! - `domain` - Value types (credentials, endpoints, workflow documents, run references)
//! - `transport` - Run-service capability trait, channel properties and channel binding
//! - `registry` - Service registry trait and registry key catalog
//! - `service` - `ServiceLocator`, `ServerConnection` and the HTTP registry client
//! - `config` - Client configuration from file and environment
//! - `error` - Public error taxonomy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taverna_core::{ConnectionConfig, ServerConnection, WorkflowSource};
//!
//! let config = ConnectionConfig::with_login("http://example.org/taverna", "alice", "secret");
//! let connection = ServerConnection::open(config, &factory)?;
//!
//! // Created but not started
//! let run = connection.create_run(WorkflowSource::file("pipeline.t2flow")).await?;
//! println!("created {}", run.id());
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod registry;
pub mod service;
pub mod transport;

// Re-export commonly used types
pub use config::{ClientConfig, ConfigError};
pub use domain::*;
pub use error::{ErrorCategory, ResolutionError, TavernaError};
pub use registry::*;
pub use service::*;
pub use transport::*;
