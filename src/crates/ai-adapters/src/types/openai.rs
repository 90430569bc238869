use super::unified::{UnifiedResponse, UnifiedTokenUsage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAIUsage> for UnifiedTokenUsage {
    fn from(usage: OpenAIUsage) -> Self {
        Self {
            prompt_token_count: usage.prompt_tokens,
            candidates_token_count: usage.completion_tokens,
            total_token_count: usage.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[allow(dead_code)]
    role: Option<String>,
    content: Option<String>,
}

/// One `data:` frame of a chat-completions stream.
#[derive(Debug, Deserialize)]
pub struct OpenAISSEData {
    #[allow(dead_code)]
    #[serde(default)]
    id: String,
    #[allow(dead_code)]
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    usage: Option<OpenAIUsage>,
}

impl OpenAISSEData {
    /// `None` for keepalive chunks that carry neither choices nor usage.
    pub fn into_unified_response(self) -> Option<UnifiedResponse> {
        let usage = self.usage.map(UnifiedTokenUsage::from);

        let Some(first_choice) = self.choices.into_iter().next() else {
            // OpenAI emits `choices: []` for the final usage chunk.
            return usage.map(|usage| UnifiedResponse {
                usage: Some(usage),
                ..Default::default()
            });
        };

        Some(UnifiedResponse {
            text: first_choice.delta.content,
            usage,
            finish_reason: first_choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::OpenAISSEData;

    #[test]
    fn extracts_text_delta_from_first_choice() {
        let raw = r#"{
            "id": "chatcmpl_test",
            "object": "chat.completion.chunk",
            "model": "gpt-test",
            "choices": [{
                "index": 0,
                "delta": { "content": "hello" },
                "finish_reason": null
            }]
        }"#;

        let sse_data: OpenAISSEData = serde_json::from_str(raw).expect("valid openai sse data");
        let response = sse_data.into_unified_response().expect("one response");

        assert_eq!(response.text.as_deref(), Some("hello"));
        assert!(response.finish_reason.is_none());
        assert!(response.usage.is_none());
    }

    #[test]
    fn keeps_finish_reason_on_empty_delta() {
        let raw = r#"{
            "id": "chatcmpl_test",
            "model": "gpt-test",
            "choices": [{ "index": 0, "delta": {}, "finish_reason": "stop" }]
        }"#;

        let sse_data: OpenAISSEData = serde_json::from_str(raw).expect("valid openai sse data");
        let response = sse_data.into_unified_response().expect("one response");

        assert!(response.text.is_none());
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn handles_empty_choices_with_usage_chunk() {
        let raw = r#"{
            "id": "chatcmpl_test",
            "model": "gpt-test",
            "choices": [],
            "usage": {
                "prompt_tokens": 7,
                "completion_tokens": 3,
                "total_tokens": 10
            }
        }"#;

        let sse_data: OpenAISSEData = serde_json::from_str(raw).expect("valid openai sse data");
        let response = sse_data.into_unified_response().expect("usage response");

        assert_eq!(response.usage.map(|u| u.total_token_count), Some(10));
        assert!(response.text.is_none());
    }

    #[test]
    fn handles_empty_choices_without_usage_chunk() {
        let raw = r#"{ "id": "chatcmpl_test", "model": "gpt-test", "choices": [], "usage": null }"#;

        let sse_data: OpenAISSEData = serde_json::from_str(raw).expect("valid openai sse data");
        assert!(sse_data.into_unified_response().is_none());
    }
}
