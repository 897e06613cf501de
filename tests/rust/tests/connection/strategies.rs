//! Property sets attached for each credential strategy

use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use taverna_core::{DEFAULT_SERVER_ADDRESS, SECURITY_TOKEN_HEADER};
use tests::{
    ConnectionConfig, Credentials, MockRunService, PropertyKey, RecordingChannelFactory,
    SecurityToken, ServerConnection, TavernaError,
};

fn keys(list: &[PropertyKey]) -> BTreeSet<PropertyKey> {
    list.iter().copied().collect()
}

fn factory() -> RecordingChannelFactory {
    RecordingChannelFactory::new(Arc::new(MockRunService::new().with_max_runs(5)))
}

#[test]
fn test_each_strategy_attaches_its_property_set() {
    let cases = vec![
        (ConnectionConfig::anonymous(), keys(&[])),
        (
            ConnectionConfig::with_address("http://example.org/taverna"),
            keys(&[PropertyKey::EndpointAddress]),
        ),
        (
            ConnectionConfig::with_token("http://example.org/taverna", "abc123"),
            keys(&[PropertyKey::EndpointAddress, PropertyKey::HttpRequestHeaders]),
        ),
        (
            ConnectionConfig::default_login("alice", "secret"),
            keys(&[PropertyKey::Username, PropertyKey::Password]),
        ),
        (
            ConnectionConfig::with_login("http://example.org/taverna", "alice", "secret"),
            keys(&[
                PropertyKey::EndpointAddress,
                PropertyKey::Username,
                PropertyKey::Password,
            ]),
        ),
    ];

    for (config, expected) in cases {
        let strategy = config.credentials.strategy();
        let factory = factory();
        let conn = ServerConnection::open(config, &factory).unwrap();

        assert_eq!(conn.properties().keys(), expected, "strategy {strategy}");
        let binding = factory.last_binding().unwrap();
        assert_eq!(&binding.properties, conn.properties());
        assert_eq!(&binding.endpoint, conn.endpoint());
    }
}

#[tokio::test]
async fn test_explicit_address_without_credentials() {
    let factory = factory();
    let conn = ServerConnection::open(
        ConnectionConfig::with_address("http://example.org/taverna"),
        &factory,
    )
    .unwrap();

    assert_eq!(conn.properties().keys(), keys(&[PropertyKey::EndpointAddress]));
    assert_eq!(
        conn.properties().endpoint_address().map(|u| u.as_str()),
        Some("http://example.org/taverna")
    );
    assert_eq!(conn.max_runs().await.unwrap(), 5);
}

#[test]
fn test_token_header_is_exactly_the_token() {
    let conn = ServerConnection::open(
        ConnectionConfig::with_token("http://example.org/taverna", "abc123"),
        &factory(),
    )
    .unwrap();

    let headers = conn.properties().request_headers().unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(
        conn.properties().header(SECURITY_TOKEN_HEADER),
        Some(&["abc123".to_string()][..])
    );
}

#[test]
fn test_absent_token_sends_null_placeholder() {
    let conn = ServerConnection::open(
        ConnectionConfig::with_token("http://example.org/taverna", SecurityToken::absent()),
        &factory(),
    )
    .unwrap();

    assert_eq!(
        conn.properties().header(SECURITY_TOKEN_HEADER),
        Some(&["<null>".to_string()][..])
    );
}

#[test]
fn test_default_address_targets_local_server() {
    let factory = factory();
    let conn = ServerConnection::open(ConnectionConfig::default_login("alice", "pw"), &factory).unwrap();

    assert_eq!(conn.endpoint().as_str(), DEFAULT_SERVER_ADDRESS);
    assert_eq!(conn.properties().endpoint_address(), None);
    assert_eq!(conn.properties().username(), Some("alice"));
    assert_eq!(conn.credentials().strategy(), "username_password");
}

#[test]
fn test_malformed_address_fails_before_binding() {
    let factory = factory();
    let err = ServerConnection::open(
        ConnectionConfig {
            address: Some("http//missing-colon".to_string()),
            credentials: Credentials::token("abc123"),
        },
        &factory,
    )
    .unwrap_err();

    assert!(matches!(err, TavernaError::InvalidAddress { .. }));
    assert!(factory.bindings().is_empty());
    assert_eq!(factory.service().total_calls(), 0);
}

#[test]
fn test_opening_makes_no_remote_calls() {
    let factory = factory();
    for _ in 0..3 {
        ServerConnection::open(ConnectionConfig::with_token("https://example.org/ts", "t"), &factory)
            .unwrap();
    }
    assert_eq!(factory.bindings().len(), 3);
    assert_eq!(factory.service().total_calls(), 0);
}
