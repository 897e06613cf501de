//! Faults, HTTP errors and unusable responses

use std::time::Duration;

use taverna_core::ErrorCategory;
use tests::fixtures::hello_world;
use tests::soap::{fault, returns};
use tests::{ConnectionConfig, RemoteError, ServerConnection, TavernaError};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{connect, factory};

fn soap_fault(body: String) -> ResponseTemplate {
    ResponseTemplate::new(500).set_body_raw(body, "text/xml; charset=utf-8")
}

#[tokio::test]
async fn test_no_create_fault_is_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(soap_fault(fault("too many runs", "NoCreateException")))
        .mount(&server)
        .await;

    let err = connect(&server).create_run(hello_world()).await.unwrap_err();

    assert!(
        matches!(err, TavernaError::RunCreationRejected { ref message } if message == "too many runs"),
        "{err}"
    );
    assert_eq!(err.category(), ErrorCategory::Refused);
}

#[tokio::test]
async fn test_no_update_fault_is_creation_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(soap_fault(fault("could not write workflow", "NoUpdateException")))
        .mount(&server)
        .await;

    let err = connect(&server).create_run(hello_world()).await.unwrap_err();
    assert!(matches!(err, TavernaError::RunCreationFailed { .. }), "{err}");
}

#[tokio::test]
async fn test_other_fault_is_remote_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(soap_fault(fault("internal error", "UnknownRunException")))
        .mount(&server)
        .await;

    let err = connect(&server).list_runs().await.unwrap_err();
    match err {
        TavernaError::RemoteCallFailed {
            operation: "listRuns",
            source: RemoteError::Fault { code, message },
        } => {
            assert_eq!(code, "soap:Server");
            assert_eq!(message, "internal error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_http_error_without_soap_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = connect(&server).max_runs().await.unwrap_err();
    assert!(matches!(
        err,
        TavernaError::RemoteCallFailed {
            operation: "getMaxSimultaneousRuns",
            source: RemoteError::Http { status: 503 }
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Remote);
}

#[tokio::test]
async fn test_non_numeric_max_runs_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(body_string_contains("getMaxSimultaneousRuns"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(returns("getMaxSimultaneousRuns", &["lots"]), "text/xml"),
        )
        .mount(&server)
        .await;

    let err = connect(&server).max_runs().await.unwrap_err();
    assert!(matches!(
        err,
        TavernaError::RemoteCallFailed {
            source: RemoteError::InvalidResponse { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(returns("listRuns", &[]), "text/xml")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let conn = ServerConnection::open(
        ConnectionConfig::with_address(format!("{}/taverna", server.uri())),
        &factory(Duration::from_millis(200)),
    )
    .unwrap();

    let err = conn.list_runs().await.unwrap_err();
    assert!(matches!(
        err,
        TavernaError::RemoteCallFailed {
            source: RemoteError::Timeout { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    // Nothing listens on the discard port
    let conn = ServerConnection::open(
        ConnectionConfig::with_address("http://127.0.0.1:9/taverna"),
        &factory(Duration::from_secs(2)),
    )
    .unwrap();

    let err = conn.notifier_protocols().await.unwrap_err();
    assert!(matches!(
        err,
        TavernaError::RemoteCallFailed {
            operation: "getEnabledNotificationFabrics",
            source: RemoteError::Transport { .. } | RemoteError::Timeout { .. }
        }
    ));
}
