use serde::{Deserialize, Serialize};

/// One message of the chat-completions `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub role: String,
    pub content: String,
}

impl ChatMessagePayload {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessagePayload>,
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn streaming(model: impl Into<String>, messages: Vec<ChatMessagePayload>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
        }
    }

    /// Full endpoint URL for an OpenAI-compatible base, tolerating a trailing
    /// slash or an already-present `/v1`.
    pub fn endpoint(base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }
}
