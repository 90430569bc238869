use crate::chat::message::{Message, WireMessage};
use crate::util::errors::{LightChatError, LightChatResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Raw response body chunks, in arrival order.
pub type ChunkStream = BoxStream<'static, LightChatResult<Vec<u8>>>;

/// Opens one streamed chat completion.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_stream(
        &self,
        api_key: Option<&str>,
        messages: &[Message],
    ) -> LightChatResult<ChunkStream>;
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    messages: &'a [WireMessage],
}

/// Talks to the LightChat proxy's `POST /api/chat`, which answers with a
/// chunked plain-text body.
#[derive(Debug, Clone)]
pub struct ProxyTransport {
    client: Client,
    base_url: String,
}

impl ProxyTransport {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> LightChatResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for ProxyTransport {
    async fn open_stream(
        &self,
        api_key: Option<&str>,
        messages: &[Message],
    ) -> LightChatResult<ChunkStream> {
        let wire: Vec<WireMessage> = messages.iter().map(WireMessage::from).collect();
        let url = self.chat_url();
        debug!("Opening chat stream: url={}, messages={}", url, wire.len());

        let mut request = self
            .client
            .post(&url)
            .json(&ChatRequestBody { messages: &wire });
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message_from_response(status, &body);
            error!("Chat request rejected: status={}, message={}", status, message);
            return Err(LightChatError::service(message));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(LightChatError::from));
        Ok(stream.boxed())
    }
}

/// Pick the most useful text for a failed response: the provider's own
/// message, else the status reason, else a generic fallback.
pub fn error_message_from_response(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let error = json.get("error");
        let message = error
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .or_else(|| error.and_then(|e| e.as_str()));
        if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
            return message.to_string();
        }
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| "Service Error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_provider_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        assert_eq!(
            error_message_from_response(StatusCode::UNAUTHORIZED, body),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn accepts_string_error_shape() {
        let body = r#"{"error":"quota exceeded"}"#;
        assert_eq!(
            error_message_from_response(StatusCode::TOO_MANY_REQUESTS, body),
            "quota exceeded"
        );
    }

    #[test]
    fn falls_back_to_status_reason() {
        assert_eq!(
            error_message_from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "Bad Gateway"
        );
    }

    #[test]
    fn unknown_status_falls_back_to_service_error() {
        let status = StatusCode::from_u16(599).expect("valid status");
        assert_eq!(error_message_from_response(status, ""), "Service Error");
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let transport = ProxyTransport::with_client(Client::new(), "http://localhost:3000/");
        assert_eq!(transport.chat_url(), "http://localhost:3000/api/chat");
    }
}
