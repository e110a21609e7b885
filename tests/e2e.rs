//! End-to-end tests driving the router the way an MCP client would.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use mcp_sse_server::core::{API_KEY_HEADER, Config, HttpConfig, HttpTransport, McpServer};
use mcp_sse_server::domains::mail::{MailError, Mailer, OutgoingEmail};

const API_KEY: &str = "test_auth_key";

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    delay: Option<Duration>,
}

impl RecordingMailer {
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail, _credential: &str) -> Result<(), MailError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

fn serve(mailer: Arc<RecordingMailer>) -> (HttpTransport, Router) {
    let mut config = Config::default();
    config.auth.api_key = API_KEY.to_string();
    config.credentials.postmark_api_key = "pm-token".to_string();
    config.credentials.sender_email = "sender@example.com".to_string();

    let server = McpServer::from_config(config, mailer).unwrap();
    let transport = HttpTransport::new(HttpConfig::default());
    let router = transport.router(server);
    (transport, router)
}

fn app(mailer: Arc<RecordingMailer>) -> Router {
    serve(mailer).1
}

fn request(method: Method, uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_message(endpoint: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(endpoint)
        .header(API_KEY_HEADER, API_KEY)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read the next SSE event as `(event, data)`, skipping keep-alives.
async fn next_event(body: &mut Body) -> (String, String) {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("body error");
        let Ok(data) = frame.into_data() else {
            continue;
        };
        let text = String::from_utf8(data.to_vec()).unwrap();

        let mut event = "message".to_string();
        let mut payload = None;
        for line in text.lines() {
            if let Some(value) = line.strip_prefix("event:") {
                event = value.trim_start().to_string();
            } else if let Some(value) = line.strip_prefix("data:") {
                payload = Some(value.trim_start().to_string());
            }
        }
        if let Some(payload) = payload {
            return (event, payload);
        }
    }
}

/// Open a session and return its stream with the announced endpoint.
async fn connect(app: &Router) -> (Body, String) {
    let response = app.clone().oneshot(request(Method::GET, "/sse", Some(API_KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let (event, endpoint) = next_event(&mut body).await;
    assert_eq!(event, "endpoint");
    (body, endpoint)
}

async fn call_tool(app: &Router, body: &mut Body, endpoint: &str, id: i64, name: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    });
    let response = app.clone().oneshot(post_message(endpoint, request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (event, data) = next_event(body).await;
    assert_eq!(event, "message");
    let message: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(message["id"], id);
    message
}

#[tokio::test]
async fn rejects_wrong_key_and_announces_endpoint_for_right_key() {
    let app = app(Arc::default());

    let response = app.clone().oneshot(request(Method::GET, "/sse", Some("wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let response = app.clone().oneshot(request(Method::GET, "/sse", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (_body, endpoint) = connect(&app).await;
    let session_id = endpoint.strip_prefix("/messages/").unwrap();
    assert!(uuid::Uuid::parse_str(session_id).is_ok());
}

#[tokio::test]
async fn status_tool_reports_ok() {
    let app = app(Arc::default());
    let (mut body, endpoint) = connect(&app).await;

    let message = call_tool(&app, &mut body, &endpoint, 1, "status", json!({})).await;
    assert_eq!(message["result"]["structuredContent"]["status"], "ok");
    assert_eq!(message["result"]["isError"], false);
}

#[tokio::test]
async fn send_email_filters_invalid_recipients() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(Arc::clone(&mailer));
    let (mut body, endpoint) = connect(&app).await;

    let message = call_tool(
        &app,
        &mut body,
        &endpoint,
        1,
        "send_email",
        json!({ "recipients": ["a@b.com", "not-an-email"], "subject": "Hi", "body": "Hello" }),
    )
    .await;
    assert_eq!(
        message["result"]["content"][0]["text"],
        "Email sent successfully to 1 recipients"
    );

    let sent = mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["a@b.com".to_string()]);
    assert_eq!(sent[0].from, "sender@example.com");

    let message = call_tool(
        &app,
        &mut body,
        &endpoint,
        2,
        "send_email",
        json!({ "recipients": [], "subject": "Hi", "body": "Hello" }),
    )
    .await;
    assert_eq!(message["result"]["isError"], true);
    let text = message["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("No valid email addresses provided"));
}

#[tokio::test]
async fn unknown_session_does_not_disturb_open_session() {
    let app = app(Arc::default());
    let (mut body, endpoint) = connect(&app).await;

    let ping = json!({ "jsonrpc": "2.0", "id": 9, "method": "ping" });
    let bogus = format!("/messages/{}", uuid::Uuid::new_v4());
    let response = app.clone().oneshot(post_message(&bogus, ping.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(post_message("/messages/not-a-uuid", ping)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let message = call_tool(&app, &mut body, &endpoint, 3, "status", json!({})).await;
    assert_eq!(message["result"]["structuredContent"]["status"], "ok");
}

#[tokio::test]
async fn unparseable_message_is_bad_request() {
    let app = app(Arc::default());
    let (_body, endpoint) = connect(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(&endpoint)
        .header(API_KEY_HEADER, API_KEY)
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tools_list_and_head_check() {
    let app = app(Arc::default());
    let (mut body, endpoint) = connect(&app).await;

    let request = json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/list" });
    let response = app.clone().oneshot(post_message(&endpoint, request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (_, data) = next_event(&mut body).await;
    let message: Value = serde_json::from_str(&data).unwrap();
    let names: Vec<&str> = message["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["send_email", "status"]);

    let head = Request::builder()
        .method(Method::HEAD)
        .uri("/sse")
        .header(API_KEY_HEADER, API_KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(head).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_and_options_answer_behind_the_gate() {
    let app = app(Arc::default());

    let response = app.clone().oneshot(request(Method::GET, "/health", Some(API_KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health = json_body(response.into_body()).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "mcp-sse-server");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    let response = app.clone().oneshot(request(Method::GET, "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(request(Method::OPTIONS, "/sse", Some(API_KEY))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.into_body()).await["status"], "ok");

    let response = app.clone().oneshot(request(Method::OPTIONS, "/sse", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn every_route_requires_the_key() {
    let app = app(Arc::default());
    let (_body, endpoint) = connect(&app).await;

    let response = app.clone().oneshot(request(Method::HEAD, "/sse", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let ping = json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" });
    let unauthenticated = Request::builder()
        .method(Method::POST)
        .uri(&endpoint)
        .header("content-type", "application/json")
        .body(Body::from(ping.to_string()))
        .unwrap();
    let response = app.clone().oneshot(unauthenticated).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response.into_body()).await, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn slow_send_only_delays_its_own_session() {
    let mailer = Arc::new(RecordingMailer::slow(Duration::from_millis(1500)));
    let (transport, app) = serve(Arc::clone(&mailer));
    let (mut slow_body, slow_endpoint) = connect(&app).await;
    let (mut fast_body, fast_endpoint) = connect(&app).await;
    assert_eq!(transport.sessions().len(), 2);

    let send = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {
            "name": "send_email",
            "arguments": { "recipients": ["a@b.com"], "subject": "Hi", "body": "Hello" }
        }
    });
    let response = app.clone().oneshot(post_message(&slow_endpoint, send)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let message = call_tool(&app, &mut fast_body, &fast_endpoint, 2, "status", json!({})).await;
    assert_eq!(message["result"]["structuredContent"]["status"], "ok");
    assert_eq!(mailer.sent_count(), 0);

    let (_, data) = next_event(&mut slow_body).await;
    let message: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(message["id"], 1);
    assert_eq!(mailer.sent_count(), 1);

    drop(slow_body);
    assert_eq!(transport.sessions().len(), 1);

    let ping = json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" });
    let response = app.clone().oneshot(post_message(&slow_endpoint, ping)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn null_id_is_answered() {
    let app = app(Arc::default());
    let (mut body, endpoint) = connect(&app).await;

    let ping = json!({ "jsonrpc": "2.0", "id": null, "method": "ping" });
    let response = app.clone().oneshot(post_message(&endpoint, ping)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (_, data) = next_event(&mut body).await;
    let message: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(message, json!({ "jsonrpc": "2.0", "id": null, "result": {} }));
}
