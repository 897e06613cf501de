//! # Taverna SOAP transport
//!
//! Document/literal SOAP 1.1 over HTTP for the Taverna Server run service.
//!
//! - `envelope` - request envelopes for each remote operation
//! - `response` - `<return>` values and SOAP faults from response bodies
//! - `channel` - [`SoapChannel`] (a [`taverna_core::RunService`]) and its factory

mod channel;
pub mod envelope;
mod response;

pub use channel::{SoapChannel, SoapChannelFactory, SoapConfig};
pub use envelope::{Operation, SERVER_NAMESPACE, SOAP_ENVELOPE_NAMESPACE};
