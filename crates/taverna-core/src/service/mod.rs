//! Client services
//!
//! Endpoint discovery and the connection façade built on the transport and
//! registry traits.

mod connection;
mod locator;
mod registry_api_client;

pub use connection::{parse_server_address, ConnectionConfig, ServerConnection, DEFAULT_SERVER_ADDRESS};
pub use locator::ServiceLocator;
pub use registry_api_client::HttpRegistryClient;
