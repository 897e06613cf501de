//! Requests and successful responses

use pretty_assertions::assert_eq;
use tests::fixtures::{hello_world, named_workflow};
use tests::soap::{envelope, returns};
use tests::ConnectionConfig;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{connect, connect_with};

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/xml; charset=utf-8")
}

#[tokio::test]
async fn test_max_runs_from_stub() {
    tests::logging::init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/taverna"))
        .and(header_regex("content-type", "^text/xml"))
        .and(header("SOAPAction", "\"\""))
        .and(body_string_contains("getMaxSimultaneousRuns"))
        .and(body_string_contains("http://ns.taverna.org.uk/2010/xml/server/soap/"))
        .respond_with(xml(returns("getMaxSimultaneousRuns", &["5"])))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connect(&server);
    assert_eq!(conn.max_runs().await.unwrap(), 5);
}

#[tokio::test]
async fn test_security_token_header_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("Helio-Security-Token", "abc123"))
        .respond_with(xml(returns("listRuns", &["run-1"])))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connect_with(ConnectionConfig::with_token(
        format!("{}/taverna", server.uri()),
        "abc123",
    ));
    let runs = conn.list_runs().await.unwrap();
    assert_eq!(runs[0].id().as_str(), "run-1");
}

#[tokio::test]
async fn test_login_sent_as_basic_auth() {
    let server = MockServer::start().await;

    // alice:pw
    Mock::given(method("POST"))
        .and(header("Authorization", "Basic YWxpY2U6cHc="))
        .respond_with(xml(returns("getPermittedListenerTypes", &["io"])))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connect_with(ConnectionConfig::with_login(
        format!("{}/taverna", server.uri()),
        "alice",
        "pw",
    ));
    assert_eq!(conn.listener_types().await.unwrap(), vec!["io"]);
}

#[tokio::test]
async fn test_submit_workflow_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ts:submitWorkflow"))
        .and(body_string_contains(
            r#"<workflow><workflow xmlns="http://taverna.sf.net/2008/xml/t2flow""#,
        ))
        .respond_with(xml(returns("submitWorkflow", &["0b7e3a7c-run"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<ts:listRuns"))
        .respond_with(xml(returns("listRuns", &["older-run", "0b7e3a7c-run"])))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connect(&server);
    let created = conn.create_run(hello_world()).await.unwrap();
    let listed = conn.list_runs().await.unwrap();

    assert_eq!(created.id().as_str(), "0b7e3a7c-run");
    let ids: Vec<&str> = listed.iter().map(|run| run.id().as_str()).collect();
    assert_eq!(ids, vec!["older-run", "0b7e3a7c-run"]);
    assert!(listed.iter().any(|run| run.same_run(&created)));
}

#[tokio::test]
async fn test_notifier_protocols_and_empty_listener_types() {
    let server = MockServer::start().await;

    Mock::given(body_string_contains("getEnabledNotificationFabrics"))
        .respond_with(xml(returns("getEnabledNotificationFabrics", &["mailto", "xmpp"])))
        .mount(&server)
        .await;
    Mock::given(body_string_contains("getPermittedListenerTypes"))
        .respond_with(xml(returns("getPermittedListenerTypes", &[])))
        .mount(&server)
        .await;

    let conn = connect(&server);
    assert_eq!(conn.notifier_protocols().await.unwrap(), vec!["mailto", "xmpp"]);
    assert!(conn.listener_types().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_permitted_workflows_parsed() {
    let server = MockServer::start().await;
    let blast = named_workflow("blast");

    Mock::given(body_string_contains("getPermittedWorkflows"))
        .respond_with(xml(envelope(&format!(
            r#"<ns2:getPermittedWorkflowsResponse xmlns:ns2="http://ns.taverna.org.uk/2010/xml/server/soap/"><return>{}</return></ns2:getPermittedWorkflowsResponse>"#,
            blast.xml()
        ))))
        .mount(&server)
        .await;

    let conn = connect(&server);
    let permitted = conn.permitted_workflows().await.unwrap();

    assert_eq!(permitted.len(), 1);
    assert!(permitted.permits(&blast));
    assert!(!permitted.permits(&named_workflow("other")));
}

#[tokio::test]
async fn test_permitted_workflow_with_server_prefixes_matches_local_file() {
    let server = MockServer::start().await;

    // t2 is declared on the response wrapper, not on the workflow itself
    Mock::given(body_string_contains("getPermittedWorkflows"))
        .respond_with(xml(envelope(
            r#"<ns2:getPermittedWorkflowsResponse xmlns:ns2="http://ns.taverna.org.uk/2010/xml/server/soap/" xmlns:t2="http://taverna.sf.net/2008/xml/t2flow"><return><t2:workflow version="1"><t2:dataflow role="top"><t2:name>blast</t2:name></t2:dataflow></t2:workflow></return></ns2:getPermittedWorkflowsResponse>"#,
        )))
        .mount(&server)
        .await;

    let conn = connect(&server);
    let permitted = conn.permitted_workflows().await.unwrap();

    assert_eq!(permitted.len(), 1);
    assert_eq!(
        permitted.as_slice()[0].namespace(),
        Some("http://taverna.sf.net/2008/xml/t2flow")
    );
    assert!(permitted.permits(&named_workflow("blast")));
    assert!(!permitted.permits(&named_workflow("other")));
}

#[tokio::test]
async fn test_empty_permitted_workflows_unrestricted() {
    let server = MockServer::start().await;

    Mock::given(body_string_contains("getPermittedWorkflows"))
        .respond_with(xml(returns("getPermittedWorkflows", &[])))
        .mount(&server)
        .await;

    let conn = connect(&server);
    assert!(conn.permitted_workflows().await.unwrap().is_unrestricted());
}

#[tokio::test]
async fn test_capabilities_over_soap() {
    let server = MockServer::start().await;

    for (operation, values) in [
        ("getEnabledNotificationFabrics", vec!["mailto"]),
        ("getMaxSimultaneousRuns", vec!["7"]),
        ("getPermittedListenerTypes", vec!["io"]),
        ("getPermittedWorkflows", vec![]),
    ] {
        Mock::given(body_string_contains(operation))
            .respond_with(xml(returns(operation, &values)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let snapshot = connect(&server).capabilities().await.unwrap();

    assert_eq!(snapshot.max_runs, 7);
    assert_eq!(snapshot.notifier_protocols, vec!["mailto"]);
    assert_eq!(snapshot.listener_types, vec!["io"]);
    assert!(snapshot.permitted_workflows.is_unrestricted());
}
