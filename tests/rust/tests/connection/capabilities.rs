//! Capability metadata queries

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tests::fixtures::named_workflow;
use tests::{
    ConnectionConfig, MockRunService, RecordingChannelFactory, RemoteError, ServerConnection,
    TavernaError,
};

fn connect(service: MockRunService) -> (ServerConnection, Arc<MockRunService>) {
    let service = Arc::new(service);
    let factory = RecordingChannelFactory::new(service.clone());
    let conn = ServerConnection::open(ConnectionConfig::anonymous(), &factory).unwrap();
    (conn, service)
}

#[tokio::test]
async fn test_empty_permitted_list_means_unrestricted() {
    let (conn, _) = connect(MockRunService::new());

    let permitted = conn.permitted_workflows().await.unwrap();

    assert!(permitted.is_empty());
    assert!(permitted.is_unrestricted());
    assert!(permitted.permits(&named_workflow("anything")));
}

#[tokio::test]
async fn test_non_empty_permitted_list_is_exhaustive() {
    let (conn, _) = connect(
        MockRunService::new()
            .with_permitted_workflows(vec![named_workflow("fits_to_png"), named_workflow("blast")]),
    );

    let permitted = conn.permitted_workflows().await.unwrap();

    assert_eq!(permitted.len(), 2);
    assert!(permitted.permits(&named_workflow("blast")));
    assert!(!permitted.permits(&named_workflow("unlisted")));
}

#[tokio::test]
async fn test_queries_pass_values_through() {
    let (conn, _) = connect(
        MockRunService::new()
            .with_max_runs(5)
            .with_notifier_protocols(&["mailto", "xmpp", "twitter"])
            .with_listener_types(&["io"]),
    );

    assert_eq!(conn.max_runs().await.unwrap(), 5);
    assert_eq!(
        conn.notifier_protocols().await.unwrap(),
        vec!["mailto", "xmpp", "twitter"]
    );
    assert_eq!(conn.listener_types().await.unwrap(), vec!["io"]);
}

#[tokio::test]
async fn test_empty_listener_types_is_valid() {
    let (conn, _) = connect(MockRunService::new());
    assert!(conn.listener_types().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_each_query_is_one_uncached_call() {
    let (conn, service) = connect(MockRunService::new().with_max_runs(3));

    conn.max_runs().await.unwrap();
    conn.max_runs().await.unwrap();
    conn.notifier_protocols().await.unwrap();

    assert_eq!(service.calls("getMaxSimultaneousRuns"), 2);
    assert_eq!(service.calls("getEnabledNotificationFabrics"), 1);
    assert_eq!(service.total_calls(), 3);
}

#[tokio::test]
async fn test_failures_surface_without_defaults() {
    let (conn, service) = connect(
        MockRunService::new()
            .with_max_runs(5)
            .failing_queries(RemoteError::Http { status: 502 }),
    );

    let cases: Vec<(&str, TavernaError)> = vec![
        ("listRuns", conn.list_runs().await.unwrap_err()),
        ("getMaxSimultaneousRuns", conn.max_runs().await.unwrap_err()),
        (
            "getEnabledNotificationFabrics",
            conn.notifier_protocols().await.unwrap_err(),
        ),
        (
            "getPermittedListenerTypes",
            conn.listener_types().await.unwrap_err(),
        ),
        (
            "getPermittedWorkflows",
            conn.permitted_workflows().await.unwrap_err(),
        ),
    ];

    for (expected, err) in cases {
        match err {
            TavernaError::RemoteCallFailed { operation, source } => {
                assert_eq!(operation, expected);
                assert_eq!(source, RemoteError::Http { status: 502 });
            }
            other => panic!("unexpected error for {expected}: {other}"),
        }
    }
    assert_eq!(service.total_calls(), 5);
}

#[tokio::test]
async fn test_capability_snapshot_issues_four_calls() {
    let (conn, service) = connect(
        MockRunService::new()
            .with_max_runs(10)
            .with_notifier_protocols(&["mailto"])
            .with_permitted_workflows(vec![named_workflow("blast")]),
    );

    let snapshot = conn.capabilities().await.unwrap();

    assert_eq!(snapshot.max_runs, 10);
    assert_eq!(snapshot.notifier_protocols, vec!["mailto"]);
    assert!(snapshot.listener_types.is_empty());
    assert!(!snapshot.permitted_workflows.is_unrestricted());
    assert_eq!(service.total_calls(), 4);
    assert_eq!(service.calls("listRuns"), 0);
}
