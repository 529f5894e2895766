//! StatusClient against a mock node RPC.

use std::time::Duration;

use clap::Parser;
use gateway_dashboard::config::{Args, Config};
use gateway_dashboard::data::{FetchError, StatusClient};
use gateway_dashboard::routes::{Route, RouteTable};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SYNCED: &str = r#"{"result":{"sync_info":{"latest_block_height":"100","latest_block_time":"2024-01-01T00:00:00Z","catching_up":false},"node_info":{"network":"pocket","version":"1.0.0"}}}"#;

fn client_for(server: &MockServer, timeout_ms: u64) -> StatusClient {
    let timeout = timeout_ms.to_string();
    let args = Args::parse_from([
        "gateway-dashboard",
        "--node-url",
        &server.uri(),
        "--timeout-ms",
        &timeout,
    ]);
    StatusClient::from_config(&Config::from_args(args).unwrap()).unwrap()
}

#[tokio::test]
async fn fetches_status_through_node_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SYNCED))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 1000);
    assert_eq!(client.status_url().path(), "/status");

    let status = client.get_status().await.unwrap();
    assert_eq!(status.latest_block_height, "100");
    assert_eq!(status.network, "pocket");
    assert_eq!(status.sync_label(), "Synced");
}

#[tokio::test]
async fn non_success_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503).set_body_string(SYNCED))
        .mount(&server)
        .await;

    let err = client_for(&server, 1000).get_status().await.unwrap_err();
    assert_eq!(err, FetchError::Http { status: 503 });
}

#[tokio::test]
async fn shape_mismatch_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result":{"node_info":{"network":"x","version":"y"}}}"#))
        .mount(&server)
        .await;

    let err = client_for(&server, 1000).get_status().await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test]
async fn slow_node_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(SYNCED)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, 50).get_status().await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn unreachable_node_is_network_error() {
    let routes = RouteTable::new(vec![Route {
        prefix: "/api/node".to_string(),
        destination: Url::parse("http://127.0.0.1:1").unwrap(),
    }]);
    let client = StatusClient::new(&routes, Duration::from_secs(1)).unwrap();

    let err = client.get_status().await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}
