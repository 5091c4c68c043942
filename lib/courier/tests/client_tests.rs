//! Integration tests for `Client<HyperTransport>` using wiremock.

use std::time::Duration;

use assert2::{check, let_assert};
use courier::{ClientConfig, ClientError, FailureKind, HyperTransport, UrlComponents};
use serde::{Deserialize, Serialize};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

fn components(server: &MockServer, path: &str) -> UrlComponents {
    UrlComponents::parse(&format!("{}{path}", server.uri())).expect("mock server URL")
}

#[tokio::test]
async fn test_get_and_decode() {
    let mock_server = MockServer::start().await;
    let user = User {
        id: 1,
        name: "Alice".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&user))
        .mount(&mock_server)
        .await;

    let client = courier::client();
    let decoded: User = client
        .get_and_decode(&components(&mock_server, "/users/1"))
        .await
        .expect("user");

    assert_eq!(decoded, user);
}

#[tokio::test]
async fn test_get_returns_raw_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(203).set_body_bytes(vec![0_u8, 1, 2, 255]))
        .mount(&mock_server)
        .await;

    let body = courier::client()
        .get(&components(&mock_server, "/raw"))
        .await
        .expect("body");

    assert_eq!(body.as_ref(), &[0_u8, 1, 2, 255]);
}

#[tokio::test]
async fn test_default_headers_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header("Accept", "*/*"))
        .and(header("User-Agent", courier::DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    courier::client()
        .get(&components(&mock_server, "/headers"))
        .await
        .expect("body");
}

#[tokio::test]
async fn test_configured_user_agent_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agent"))
        .and(header("User-Agent", "inventory-sync/2.1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .user_agent("inventory-sync/2.1")
        .build();

    courier::client_with_config(config)
        .get(&components(&mock_server, "/agent"))
        .await
        .expect("body");
}

#[tokio::test]
async fn test_query_items() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust lang"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["courier"])))
        .mount(&mock_server)
        .await;

    let components = components(&mock_server, "/search")
        .query("q", "rust lang")
        .query("page", "2");

    let results: Vec<String> = courier::client()
        .get_and_decode(&components)
        .await
        .expect("results");

    assert_eq!(results, vec!["courier".to_string()]);
}

#[tokio::test]
async fn test_forbidden_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_string("go away"))
        .mount(&mock_server)
        .await;

    let result = courier::client()
        .get(&components(&mock_server, "/secret"))
        .await;

    assert_eq!(result, Err(ClientError::network(403, "forbidden")));
}

#[tokio::test]
async fn test_not_found_while_decoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = courier::client()
        .get_and_decode::<User>(&components(&mock_server, "/users/404"))
        .await;

    assert_eq!(result, Err(ClientError::network(404, "not found")));
}

#[tokio::test]
async fn test_decoding_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 2})))
        .mount(&mock_server)
        .await;

    let result = courier::client()
        .get_and_decode::<User>(&components(&mock_server, "/users/2"))
        .await;

    let_assert!(Err(ClientError::Decoding { reason, debug_reason }) = result);
    check!(reason.contains("missing field `name`"));
    check!(debug_reason.contains("key: name"));
}

#[tokio::test]
async fn test_invalid_url_never_sends() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let components = components(&mock_server, "/").path("relative");
    let result = courier::client().get(&components).await;

    assert_eq!(result, Err(ClientError::InvalidUrl));
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let client = courier::Client::new(
        HyperTransport::builder()
            .timeout(Duration::from_millis(100))
            .build(),
    );
    let result = client.get(&components(&mock_server, "/slow")).await;

    assert_eq!(
        result,
        Err(ClientError::network(
            FailureKind::TimedOut.code(),
            FailureKind::TimedOut.description()
        ))
    );
}

#[tokio::test]
async fn test_connection_refused() {
    // Reserve a port, then free it so nothing listens there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let components = UrlComponents::new()
        .scheme("http")
        .host("127.0.0.1")
        .port(port)
        .path("/");
    let result = courier::client().get(&components).await;

    assert_eq!(
        result.map_err(|e| e.code()),
        Err(Some(FailureKind::CannotConnectToHost.code()))
    );
}

#[tokio::test]
async fn test_logging_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logged"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = courier::Client::new(HyperTransport::builder().with_debug_logging().build());
    let result = client.get(&components(&mock_server, "/logged")).await;

    assert_eq!(
        result,
        Err(ClientError::network(500, "internal server error"))
    );
}

#[tokio::test]
async fn test_client_shared_across_tasks() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = std::sync::Arc::new(courier::client());
    let target = components(&mock_server, "/shared");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = std::sync::Arc::clone(&client);
            let target = target.clone();
            tokio::spawn(async move { client.get(&target).await })
        })
        .collect();

    for handle in handles {
        let body = handle.await.expect("join").expect("body");
        assert_eq!(body.as_ref(), b"ok");
    }
}
