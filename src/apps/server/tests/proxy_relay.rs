use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use lightchat_server::{build_router, AppState, ServerConfig};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Upstream {
    seen_auth: Arc<Mutex<Option<String>>>,
    seen_body: Arc<Mutex<Option<Value>>>,
}

const SSE_BODY: &str = concat!(
    "data: {\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
    "data: {\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"}}]}\n\n",
    "data: {\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" there\"}}]}\n\n",
    "data: {\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
    "data: [DONE]\n\n",
);

async fn completions(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    *upstream.seen_auth.lock().expect("lock") = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *upstream.seen_body.lock().expect("lock") = Some(body);
    Response::builder()
        .header("content-type", "text/event-stream")
        .body(Body::from(SSE_BODY))
        .expect("response")
}

async fn rejecting_completions() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "message": "Incorrect API key provided" } })),
    )
        .into_response()
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{}", addr)
}

async fn start_proxy(upstream_url: String, api_keys: Vec<&str>) -> String {
    let config = ServerConfig {
        upstream_url,
        model: "test-model".to_string(),
        api_keys: api_keys.into_iter().map(str::to_string).collect(),
        ..ServerConfig::default()
    };
    serve(build_router(AppState::new(config).expect("state"))).await
}

fn chat_body() -> Value {
    json!({ "messages": [
        { "role": "system", "content": "be brief" },
        { "role": "user", "content": "hi" }
    ]})
}

#[tokio::test]
async fn relays_stream_as_plain_text() {
    let upstream = Upstream::default();
    let upstream_url = serve(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(upstream.clone()),
    )
    .await;
    let proxy = start_proxy(upstream_url, vec!["sk-shared"]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .bearer_auth("sk-user")
        .json(&chat_body())
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/plain")));
    assert_eq!(response.text().await.expect("body"), "Hello there");

    assert_eq!(upstream.seen_auth.lock().expect("lock").as_deref(), Some("Bearer sk-user"));
    let body = upstream.seen_body.lock().expect("lock").clone().expect("body");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["stream"], true);
    assert_eq!(body["messages"][1]["content"], "hi");
}

#[tokio::test]
async fn falls_back_to_shared_key() {
    let upstream = Upstream::default();
    let upstream_url = serve(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(upstream.clone()),
    )
    .await;
    let proxy = start_proxy(upstream_url, vec!["sk-shared"]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .json(&chat_body())
        .send()
        .await
        .expect("send");
    assert_eq!(response.text().await.expect("body"), "Hello there");
    assert_eq!(upstream.seen_auth.lock().expect("lock").as_deref(), Some("Bearer sk-shared"));
}

#[tokio::test]
async fn missing_key_is_unauthorized() {
    let proxy = start_proxy("http://127.0.0.1:9".to_string(), vec![]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .json(&chat_body())
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"]["message"], "No API key provided");
}

#[tokio::test]
async fn upstream_error_is_relayed() {
    let upstream_url = serve(Router::new().route("/v1/chat/completions", post(rejecting_completions))).await;
    let proxy = start_proxy(upstream_url, vec!["sk-shared"]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .json(&chat_body())
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"]["message"], "Incorrect API key provided");
}

#[tokio::test]
async fn empty_messages_are_rejected() {
    let proxy = start_proxy("http://127.0.0.1:9".to_string(), vec!["sk-shared"]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .json(&json!({ "messages": [] }))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn available_key_endpoint() {
    let proxy = start_proxy("http://127.0.0.1:9".to_string(), vec!["sk-shared"]).await;
    let body: Value = reqwest::get(format!("{}/api/get_available_api_key", proxy))
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(body["apiKey"], "sk-shared");

    let empty = start_proxy("http://127.0.0.1:9".to_string(), vec![]).await;
    let body: Value = reqwest::get(format!("{}/api/get_available_api_key", empty))
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(body["apiKey"], "");
}
