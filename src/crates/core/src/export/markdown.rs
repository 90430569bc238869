use super::{ConversationRenderer, ExportFormat, RenderContext};
use crate::chat::message::{Message, MessageRole};
use crate::util::errors::LightChatResult;

pub struct MarkdownRenderer;

impl ConversationRenderer for MarkdownRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Markdown
    }

    fn render(&self, messages: &[Message], context: &RenderContext) -> LightChatResult<Vec<u8>> {
        let mut out = format!("# {}\n\n", context.title);
        for message in messages {
            let speaker = match message.role {
                MessageRole::User => "You",
                MessageRole::Assistant => "Assistant",
                MessageRole::System => "System",
            };
            out.push_str(&format!(
                "### {} {}\n\n{}\n\n",
                context.avatar_for(message.role),
                speaker,
                message.content.trim_end()
            ));
        }
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_per_message() {
        let messages = vec![Message::user("What is Rust?"), Message::assistant("A language.\n")];
        let bytes = MarkdownRenderer
            .render(&messages, &RenderContext::default())
            .expect("render");
        let text = String::from_utf8(bytes).expect("utf8");

        assert!(text.starts_with("# LightChat\n"));
        assert!(text.contains("### 🦊 You\n\nWhat is Rust?\n"));
        assert!(text.contains("### 🤖 Assistant\n\nA language.\n"));
    }
}
