//! HTTP routes: fallback key endpoint and the streaming chat relay.

use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use lightchat_ai_adapters::{ChatCompletionRequest, ChatMessagePayload, UnifiedResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableApiKeyResponse {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub messages: Vec<ChatMessagePayload>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub keys: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        keys: state.keys.len(),
    })
}

/// Hand out one shared key, or an empty string when none is configured.
pub async fn get_available_api_key(State(state): State<AppState>) -> Json<AvailableApiKeyResponse> {
    let api_key = state.keys.pick().unwrap_or_default().to_string();
    Json(AvailableApiKeyResponse { api_key })
}

pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequestBody>,
) -> Response {
    if body.messages.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "messages must not be empty");
    }

    let Some(api_key) = bearer_token(&headers).or_else(|| state.keys.pick().map(str::to_string))
    else {
        return error_response(StatusCode::UNAUTHORIZED, "No API key provided");
    };

    let url = ChatCompletionRequest::endpoint(&state.config.upstream_url);
    let payload = ChatCompletionRequest::streaming(state.config.model.clone(), body.messages);
    tracing::debug!(
        "Relaying chat request: url={}, model={}, messages={}",
        url,
        payload.model,
        payload.messages.len()
    );

    let upstream = match state
        .http
        .post(&url)
        .bearer_auth(&api_key)
        .json(&payload)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Upstream request failed: {}", e);
            return error_response(StatusCode::BAD_GATEWAY, &format!("Upstream unreachable: {}", e));
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        let raw = upstream.text().await.unwrap_or_default();
        let message = upstream_error_message(&raw)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "Service Error".to_string());
        tracing::warn!("Upstream returned {}: {}", status, message);
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return error_response(status, &message);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let idle_timeout = state.config.idle_timeout();
    tokio::spawn(lightchat_ai_adapters::handle_openai_stream(upstream, tx, idle_timeout));

    let text_stream = UnboundedReceiverStream::new(rx).filter_map(|item| async move { relay_chunk(item) });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(text_stream))
        .unwrap_or_else(|e| {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("Response build failed: {}", e))
        })
}

/// Body bytes for one upstream chunk. Only text deltas reach the client;
/// token usage is logged.
fn relay_chunk(item: anyhow::Result<UnifiedResponse>) -> Option<Result<String, std::io::Error>> {
    match item {
        Ok(response) => {
            if let Some(usage) = &response.usage {
                tracing::debug!(
                    "Upstream usage: prompt_tokens={}, completion_tokens={}, total_tokens={}",
                    usage.prompt_token_count,
                    usage.candidates_token_count,
                    usage.total_token_count
                );
            }
            response.text.filter(|text| !text.is_empty()).map(Ok)
        }
        Err(e) => {
            tracing::warn!("Upstream stream ended with error: {}", e);
            Some(Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn upstream_error_message(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    lightchat_ai_adapters::extract_sse_api_error_message(&value)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": { "message": message } }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_ignores_blank_and_other_schemes() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer sk-1"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("sk-1"));
    }

    #[test]
    fn relay_chunk_forwards_text_and_drops_usage_only_chunks() {
        let text = UnifiedResponse {
            text: Some("Hel".to_string()),
            ..Default::default()
        };
        assert_eq!(relay_chunk(Ok(text)).map(|r| r.ok()), Some(Some("Hel".to_string())));

        let usage_only = UnifiedResponse {
            usage: Some(lightchat_ai_adapters::UnifiedTokenUsage {
                prompt_token_count: 7,
                candidates_token_count: 3,
                total_token_count: 10,
            }),
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        };
        assert!(relay_chunk(Ok(usage_only)).is_none());

        let failed = relay_chunk(Err(anyhow::anyhow!("Stream data timeout")));
        assert!(matches!(failed, Some(Err(_))));
    }

    #[test]
    fn upstream_error_message_reads_openai_shape() {
        assert_eq!(
            upstream_error_message(r#"{"error":{"message":"Incorrect API key"}}"#).as_deref(),
            Some("Incorrect API key")
        );
        assert!(upstream_error_message("<html>bad gateway</html>").is_none());
    }
}
