//! HttpClient against a mock appliance

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nfvis_common::{ConnectionConfig, Error, MediaType, Method};
use nfvis_provider::{HttpClient, ResourceClient};

fn config_for(server: &MockServer) -> ConnectionConfig {
    ConnectionConfig {
        host: server.uri(),
        user: "admin".to_string(),
        password: "secret".to_string(),
        validate_certs: false,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn fetch_sends_credentials_and_media_types() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/running/switch/vlan"))
        .and(basic_auth("admin", "secret"))
        .and(header("Accept", "application/vnd.yang.collection+json"))
        .and(header("Content-Type", "application/vnd.yang.data+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": {"switch:vlan": [{"vlan-id": 1}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server)).unwrap();
    let doc = client
        .fetch("/running/switch/vlan?deep", MediaType::Collection)
        .await
        .unwrap();

    assert_eq!(doc.unwrap()["collection"]["switch:vlan"][0]["vlan-id"], 1);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("deep"));
}

#[tokio::test]
async fn non_json_body_is_no_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config/bridges"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>empty</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server)).unwrap();
    let doc = client
        .fetch("/config/bridges?deep", MediaType::Data)
        .await
        .unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn error_status_becomes_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/config/networks/network/lan-net"))
        .and(body_json(json!({"network": {"name": "lan-net", "bridge": "lan-br"}})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": {"error": [{"error-message": "bad bridge"}]}
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server)).unwrap();
    let patch = json!({"network": {"name": "lan-net", "bridge": "lan-br"}});
    let err = client
        .apply(Method::Put, "/config/networks/network/lan-net", Some(&patch))
        .await
        .unwrap_err();

    match err {
        Error::Protocol {
            method,
            path,
            status,
            body,
        } => {
            assert_eq!(method, Method::Put);
            assert_eq!(path, "/config/networks/network/lan-net");
            assert_eq!(status, 400);
            assert_eq!(
                body.unwrap()["errors"]["error"][0]["error-message"],
                "bad bridge"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_appliance_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = ConnectionConfig {
        timeout_secs: 1,
        ..config_for(&server)
    };
    let client = HttpClient::new(&config).unwrap();
    let err = client
        .fetch("/config/system/settings", MediaType::Data)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { seconds: 1, .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn unreachable_appliance_is_transport_error() {
    let config = ConnectionConfig {
        host: "http://127.0.0.1:1".to_string(),
        user: "admin".to_string(),
        password: "secret".to_string(),
        validate_certs: false,
        timeout_secs: 5,
    };
    let client = HttpClient::new(&config).unwrap();
    let err = client
        .apply(Method::Delete, "/running/switch/vlan/10", None)
        .await
        .unwrap_err();

    assert!(err.is_transport());
}
