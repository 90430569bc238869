use crate::types::openai::OpenAISSEData;
use crate::types::unified::UnifiedResponse;
use anyhow::{anyhow, Result};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use log::{error, trace, warn};
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const OPENAI_CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";
const OPENAI_STREAM_DONE: &str = "[DONE]";

fn is_valid_chat_completion_chunk_weak(event_json: &Value) -> bool {
    match event_json.get("object").and_then(|value| value.as_str()) {
        Some(object) => object == OPENAI_CHAT_COMPLETION_CHUNK_OBJECT,
        // Several compatible servers omit `object`; accept them when `choices` is present.
        None => event_json.get("choices").is_some(),
    }
}

pub fn extract_sse_api_error_message(event_json: &Value) -> Option<String> {
    let error = event_json.get("error")?;
    if let Some(message) = error.get("message").and_then(|value| value.as_str()) {
        return Some(message.to_string());
    }
    if let Some(message) = error.as_str() {
        return Some(message.to_string());
    }
    Some("An error occurred during streaming".to_string())
}

/// Convert an upstream SSE body into a stream of [`UnifiedResponse`] events.
///
/// The sender is dropped when the stream ends, so a closed receiver means the
/// answer is complete. Failures are sent as a final `Err` before returning.
pub async fn handle_openai_stream(
    response: Response,
    tx_event: mpsc::UnboundedSender<Result<UnifiedResponse>>,
    idle_timeout: Duration,
) {
    let mut stream = response.bytes_stream().eventsource();
    let mut finished = false;

    loop {
        let sse_event = timeout(idle_timeout, stream.next()).await;
        let sse = match sse_event {
            Ok(Some(Ok(sse))) => sse,
            Ok(None) => {
                if finished {
                    // Some providers close after the finish_reason chunk without `[DONE]`.
                    return;
                }
                let error_msg = "SSE stream closed before response completed";
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
            Ok(Some(Err(e))) => {
                let error_msg = format!("SSE stream error: {}", e);
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
            Err(_) => {
                let error_msg = format!("SSE stream timeout after {}s", idle_timeout.as_secs());
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
        };

        let raw = sse.data;
        trace!("OpenAI SSE: {:?}", raw);
        if raw.trim() == OPENAI_STREAM_DONE {
            return;
        }

        let event_json: Value = match serde_json::from_str(&raw) {
            Ok(json) => json,
            Err(e) => {
                let error_msg = format!("SSE parsing error: {}, data: {}", e, &raw);
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
        };

        if let Some(api_error_message) = extract_sse_api_error_message(&event_json) {
            let error_msg = format!("SSE API error: {}", api_error_message);
            error!("{}, data: {}", error_msg, raw);
            let _ = tx_event.send(Err(anyhow!(error_msg)));
            return;
        }

        if !is_valid_chat_completion_chunk_weak(&event_json) {
            warn!(
                "Skipping non-standard OpenAI SSE event; object={}",
                event_json
                    .get("object")
                    .and_then(|value| value.as_str())
                    .unwrap_or("<missing>")
            );
            continue;
        }

        let sse_data: OpenAISSEData = match serde_json::from_value(event_json) {
            Ok(event) => event,
            Err(e) => {
                let error_msg = format!("SSE data schema error: {}, data: {}", e, &raw);
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
        };

        let Some(unified_response) = sse_data.into_unified_response() else {
            // Keepalive/metadata chunk with empty choices and no usage payload.
            trace!("Ignoring OpenAI SSE chunk without choices or usage");
            continue;
        };

        if unified_response.finish_reason.is_some() {
            finished = true;
        }
        if tx_event.send(Ok(unified_response)).is_err() {
            // Receiver went away (client disconnected); stop reading upstream.
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_sse_api_error_message, is_valid_chat_completion_chunk_weak};

    #[test]
    fn weak_filter_accepts_chat_completion_chunk() {
        let event = serde_json::json!({
            "object": "chat.completion.chunk"
        });
        assert!(is_valid_chat_completion_chunk_weak(&event));
    }

    #[test]
    fn weak_filter_rejects_non_standard_object() {
        let event = serde_json::json!({
            "object": "",
            "choices": []
        });
        assert!(!is_valid_chat_completion_chunk_weak(&event));
    }

    #[test]
    fn weak_filter_accepts_missing_object_with_choices() {
        let event = serde_json::json!({
            "id": "chatcmpl_test",
            "choices": []
        });
        assert!(is_valid_chat_completion_chunk_weak(&event));
    }

    #[test]
    fn weak_filter_rejects_missing_object_without_choices() {
        let event = serde_json::json!({
            "id": "chatcmpl_test"
        });
        assert!(!is_valid_chat_completion_chunk_weak(&event));
    }

    #[test]
    fn extracts_api_error_message_from_object_shape() {
        let event = serde_json::json!({
            "error": {
                "message": "provider error"
            }
        });
        assert_eq!(
            extract_sse_api_error_message(&event).as_deref(),
            Some("provider error")
        );
    }

    #[test]
    fn extracts_api_error_message_from_string_shape() {
        let event = serde_json::json!({
            "error": "provider error"
        });
        assert_eq!(
            extract_sse_api_error_message(&event).as_deref(),
            Some("provider error")
        );
    }

    #[test]
    fn returns_none_when_no_error_payload_exists() {
        let event = serde_json::json!({
            "object": "chat.completion.chunk"
        });
        assert!(extract_sse_api_error_message(&event).is_none());
    }
}
