//! Domain value types
//!
//! - Credentials and security tokens
//! - Registry keys and resolved endpoints
//! - Workflow documents and sources
//! - Run identifiers and references
//! - Capability metadata

mod capability;
mod credential;
mod endpoint;
mod run;
mod workflow;

pub use capability::*;
pub use credential::*;
pub use endpoint::*;
pub use run::*;
pub use workflow::*;
