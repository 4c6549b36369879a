//! Integration tests for the HTTP provisioning client
//!
//! These tests run the client against a stub broker served by axum.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use testbed_core::ServiceKind;
use testbed_provision::{ClientError, HttpServicesClient, ServiceProvisioningClient};

/// Stub broker: the answer depends on the requested kind
async fn create_service(Json(request): Json<Value>) -> Response {
    match request["kind"].as_str() {
        Some("rabbitmq") => Json(json!({
            "credentials": {
                "hostname": "10.0.0.4",
                "port": "5672",
                "username": "guest",
                "password": "guest",
                "vhost": "/",
                "name": request["name"]
            }
        }))
        .into_response(),
        Some("redis") => StatusCode::NO_CONTENT.into_response(),
        Some("mongodb") => (StatusCode::INTERNAL_SERVER_ERROR, "quota exceeded").into_response(),
        Some("cassandra") => Json(json!({ "credentials": null })).into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn slow_create_service() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::NO_CONTENT.into_response()
}

/// Start a stub broker and return its endpoint
async fn start_broker() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let router = Router::new()
        .route("/api/services", post(create_service))
        .route("/slow/services", post(slow_create_service));

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://127.0.0.1:{}", port), handle)
}

fn client(endpoint: &str, timeout: Duration) -> HttpServicesClient {
    HttpServicesClient::new(endpoint, timeout).unwrap()
}

#[tokio::test]
async fn test_returns_credentials() {
    let (base, _server) = start_broker().await;
    let client = client(&format!("{base}/api"), Duration::from_secs(5));

    let credentials = client
        .create_service("rabbitmq-test", ServiceKind::MessageBroker)
        .await
        .unwrap()
        .expect("broker returned credentials");

    assert_eq!(credentials.host(), "10.0.0.4");
    assert_eq!(credentials.port(), 5672);
    assert_eq!(credentials.attribute("vhost"), Some("/"));
    assert_eq!(credentials.attribute("name"), Some("rabbitmq-test"));
}

#[tokio::test]
async fn test_no_content_means_no_credentials() {
    let (base, _server) = start_broker().await;
    let client = client(&format!("{base}/api/"), Duration::from_secs(5));

    let result = client.create_service("redis-test", ServiceKind::Cache).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_null_credentials_means_no_credentials() {
    let (base, _server) = start_broker().await;
    let client = client(&format!("{base}/api"), Duration::from_secs(5));

    let result = client
        .create_service("cassandra-test", ServiceKind::WideColumnStore)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_missing_route_means_no_credentials() {
    let (base, _server) = start_broker().await;
    let client = client(&format!("{base}/elsewhere"), Duration::from_secs(5));

    let result = client.create_service("redis-test", ServiceKind::Cache).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_server_error_is_backend_error() {
    let (base, _server) = start_broker().await;
    let client = client(&format!("{base}/api"), Duration::from_secs(5));

    let err = client
        .create_service("mongodb-test", ServiceKind::DocumentStore)
        .await
        .unwrap_err();

    match err {
        ClientError::Backend(message) => assert!(message.contains("quota exceeded")),
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_interruption() {
    let (base, _server) = start_broker().await;
    let client = client(&format!("{base}/slow"), Duration::from_millis(200));

    let err = client
        .create_service("redis-test", ServiceKind::Cache)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Interrupted(_)));
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let port = portpicker::pick_unused_port().expect("no free port");
    let client = client(&format!("http://127.0.0.1:{port}"), Duration::from_secs(5));

    let err = client
        .create_service("redis-test", ServiceKind::Cache)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unreachable(_)));
}
