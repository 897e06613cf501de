//! SOAP request envelopes

use std::fmt;

use taverna_core::WorkflowDocument;

pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace of the Taverna Server SOAP operations
pub const SERVER_NAMESPACE: &str = "http://ns.taverna.org.uk/2010/xml/server/soap/";

/// Remote operations used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SubmitWorkflow,
    ListRuns,
    GetEnabledNotificationFabrics,
    GetMaxSimultaneousRuns,
    GetPermittedListenerTypes,
    GetPermittedWorkflows,
}

impl Operation {
    /// Element name of the request wrapper
    pub fn name(self) -> &'static str {
        match self {
            Operation::SubmitWorkflow => "submitWorkflow",
            Operation::ListRuns => "listRuns",
            Operation::GetEnabledNotificationFabrics => "getEnabledNotificationFabrics",
            Operation::GetMaxSimultaneousRuns => "getMaxSimultaneousRuns",
            Operation::GetPermittedListenerTypes => "getPermittedListenerTypes",
            Operation::GetPermittedWorkflows => "getPermittedWorkflows",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the request envelope for `operation`.
///
/// `submitWorkflow` carries the workflow's root element inside an
/// unqualified `<workflow>` wrapper; every other operation has no payload.
pub fn request(operation: Operation, workflow: Option<&WorkflowDocument>) -> String {
    let payload = workflow
        .map(|workflow| format!("<workflow>{}</workflow>", workflow.xml()))
        .unwrap_or_default();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soap:Envelope xmlns:soap="{envelope}">"#,
            "<soap:Body>",
            r#"<ts:{operation} xmlns:ts="{namespace}">{payload}</ts:{operation}>"#,
            "</soap:Body>",
            "</soap:Envelope>"
        ),
        envelope = SOAP_ENVELOPE_NAMESPACE,
        namespace = SERVER_NAMESPACE,
        operation = operation.name(),
        payload = payload,
    )
}
