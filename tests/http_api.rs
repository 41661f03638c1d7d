//! HTTP API tests driving the router in-process.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

use payment_orchestrator::config::parse_config;
use payment_orchestrator::http::X_REQUEST_ID;
use payment_orchestrator::{Components, HttpServer};

const CONFIG: &str = r#"
[retries]
max_attempts = 2
base_delay_ms = 5
max_delay_ms = 10

[health_check]
enabled = false

[[countries]]
id = 1
name = "Germany"
code = "DE"

[[countries]]
id = 2
name = "France"
code = "FR"

[[users]]
id = 1
username = "alice"
email = "alice@example.com"
country_id = 1

[[users]]
id = 2
username = "bob"
country_id = 2

[[gateways]]
id = 1
name = "sim-eu"
priority = 1
countries = [1]
"#;

fn app() -> Router {
    let config = parse_config(CONFIG).unwrap();
    let components = Components::from_config(&config);
    HttpServer::build_router(components.state, Duration::from_secs(5))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_deposit_then_callback() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/deposit", json!({"amount": "100.00", "user_id": 1, "currency": "EUR"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["message"], "Transaction deposit successfully");
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["transactionID"].as_i64().unwrap();

    let (status, body) = send(&app, get(&format!("/transactions/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], "100.00");
    assert_eq!(body["data"]["type"], "deposit");

    let (status, body) = send(&app, get(&format!("/callback?id={}&status=done&gateway=1", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "done");

    // Redelivery of the same status is accepted.
    let (status, _) = send(&app, get(&format!("/callback?id={}&status=done&gateway=1", id))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get(&format!("/callback?id={}&status=failed&gateway=1", id))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["kind"], "illegal_transition");
}

#[tokio::test]
async fn test_withdrawal() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json("/withdrawal", json!({"amount": 12.5, "user_id": 1, "currency": "EUR"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transaction withdrawal successfully");
}

#[tokio::test]
async fn test_validation_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/deposit", json!({"amount": 0, "user_id": 1, "currency": "EUR"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["kind"], "validation");

    let (status, _) = send(
        &app,
        post_json("/deposit", json!({"amount": 5, "user_id": -1, "currency": "EUR"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method("POST")
        .uri("/deposit")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn test_routing_and_lookup_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/deposit", json!({"amount": 5, "user_id": 99, "currency": "EUR"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["kind"], "not_found");

    // Bob lives in a country with no gateway.
    let (status, body) = send(
        &app,
        post_json("/deposit", json!({"amount": 5, "user_id": 2, "currency": "EUR"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["data"]["kind"], "no_gateway_available");

    let (status, _) = send(&app, get("/transactions/4242")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/transactions/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_parameter_validation() {
    let app = app();

    for uri in [
        "/callback?id=1&status=done",
        "/callback?id=1&gateway=1",
        "/callback?id=abc&status=done&gateway=1",
        "/callback?id=1&status=done&gateway=x",
        "/callback",
    ] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }

    let (status, _) = send(&app, get("/callback?id=555&status=done&gateway=1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_status() {
    let app = app();

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ok");

    let (status, body) = send(&app, get("/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["circuit_breaker"]["state"], "closed");
    assert_eq!(body["data"]["gateways"][0]["name"], "sim-eu");
    assert_eq!(body["data"]["gateways"][0]["health"], "unknown");
    assert_eq!(body["data"]["gateways"][0]["countries"][0], "DE");
}

#[tokio::test]
async fn test_request_id_propagation() {
    let app = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(X_REQUEST_ID, "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "req-123");

    let response = app.oneshot(get("/health")).await.unwrap();
    let generated = response.headers()[X_REQUEST_ID].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, String, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post_xml(uri: &str, body: &str, accept: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/xml");
    if let Some(accept) = accept {
        builder = builder.header("accept", accept);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

const XML_DEPOSIT: &str =
    "<request><amount>100.00</amount><user_id>1</user_id><currency>EUR</currency></request>";

#[tokio::test]
async fn test_xml_deposit_with_xml_response() {
    let app = app();

    let (status, content_type, body) =
        send_raw(&app, post_xml("/deposit", XML_DEPOSIT, Some("application/xml"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/xml");
    assert!(body.starts_with("<response>"), "{}", body);
    assert!(body.contains("<message>Transaction deposit successfully</message>"));
    assert!(body.contains("<transactionID>1</transactionID>"));
    assert!(body.contains("<status>pending</status>"));

    // The stored amount keeps its scale regardless of the wire format.
    let (status, body) = send(&app, get("/transactions/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], "100.00");
}

#[tokio::test]
async fn test_xml_request_defaults_to_json_response() {
    let app = app();

    let (status, content_type, body) = send_raw(&app, post_xml("/withdrawal", XML_DEPOSIT, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Transaction withdrawal successfully");

    let (_, content_type, _) = send_raw(
        &app,
        post_xml("/withdrawal", XML_DEPOSIT, Some("*/*, application/xml")),
    )
    .await;
    assert_eq!(content_type, "application/json");
}

#[tokio::test]
async fn test_accept_xml_applies_to_errors() {
    let app = app();

    let request = Request::builder()
        .uri("/transactions/4242")
        .header("accept", "text/html, text/xml")
        .body(Body::empty())
        .unwrap();
    let (status, content_type, body) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type, "application/xml");
    assert!(body.contains("<kind>not_found</kind>"), "{}", body);
    assert!(body.contains("<status_code>404</status_code>"));
}

#[tokio::test]
async fn test_request_body_format_errors() {
    let app = app();

    let (status, _) = send(&app, post_xml("/deposit", "<request><amount>", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let plain = Request::builder()
        .method("POST")
        .uri("/deposit")
        .header("content-type", "text/plain")
        .body(Body::from("amount=5"))
        .unwrap();
    let (status, body) = send(&app, plain).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["data"]["kind"], "validation");

    let missing = Request::builder()
        .method("POST")
        .uri("/deposit")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(&app, missing).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}
