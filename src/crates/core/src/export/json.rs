use super::{ConversationRenderer, ExportFormat, RenderContext};
use crate::chat::message::Message;
use crate::util::errors::LightChatResult;
use serde::Serialize;

pub struct JsonRenderer;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    title: &'a str,
    exported_at: String,
    messages: &'a [Message],
}

impl ConversationRenderer for JsonRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn render(&self, messages: &[Message], context: &RenderContext) -> LightChatResult<Vec<u8>> {
        let export = JsonExport {
            title: &context.title,
            exported_at: chrono::Utc::now().to_rfc3339(),
            messages,
        };
        Ok(serde_json::to_vec_pretty(&export)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_ids_roles_and_content() {
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let bytes = JsonRenderer
            .render(&messages, &RenderContext::default())
            .expect("render");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");

        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["messages"][0]["id"], messages[0].id.as_str());
        assert!(value["exportedAt"].is_string());
    }
}
