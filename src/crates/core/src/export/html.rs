use super::{ConversationRenderer, ExportFormat, RenderContext};
use crate::chat::message::{Message, MessageRole};
use crate::settings::Theme;
use crate::util::errors::LightChatResult;
use html_escape::encode_safe;

pub struct HtmlRenderer;

struct Palette {
    background: &'static str,
    text: &'static str,
    user_bubble: &'static str,
    robot_bubble: &'static str,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            background: "#f7f7f8",
            text: "#1f2328",
            user_bubble: "#ffffff",
            robot_bubble: "#eef2ff",
        },
        Theme::Dark => Palette {
            background: "#1e1f22",
            text: "#e6e6e6",
            user_bubble: "#2b2d31",
            robot_bubble: "#313445",
        },
    }
}

impl ConversationRenderer for HtmlRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(&self, messages: &[Message], context: &RenderContext) -> LightChatResult<Vec<u8>> {
        let colors = palette(context.theme);
        let mut body = String::new();
        for message in messages {
            let (class, bubble) = match message.role {
                MessageRole::User => ("user", colors.user_bubble),
                _ => ("assistant", colors.robot_bubble),
            };
            body.push_str(&format!(
                "<div class=\"message {}\" style=\"background:{}\"><span class=\"avatar\">{}</span><pre>{}</pre></div>\n",
                class,
                bubble,
                encode_safe(context.avatar_for(message.role)),
                encode_safe(&message.content)
            ));
        }

        let page = format!(
            "<!DOCTYPE html>\n<html data-theme=\"{theme}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\nbody {{ background:{bg}; color:{fg}; font-family:sans-serif; max-width:860px; margin:0 auto; padding:24px; }}\n.message {{ display:flex; gap:12px; padding:12px 16px; border-radius:8px; margin-bottom:8px; }}\n.avatar {{ font-size:24px; }}\npre {{ white-space:pre-wrap; word-break:break-word; margin:0; font-family:inherit; }}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n<div id=\"chatHistory\">\n{body}</div>\n</body>\n</html>\n",
            theme = context.theme,
            title = encode_safe(&context.title),
            bg = colors.background,
            fg = colors.text,
            body = body
        );
        Ok(page.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_message_content() {
        let messages = vec![Message::user("<script>alert('x')</script> & more")];
        let bytes = HtmlRenderer
            .render(&messages, &RenderContext::default())
            .expect("render");
        let html = String::from_utf8(bytes).expect("utf8");

        assert!(!html.contains("<script>"));
        assert!(!html.contains("'x'"));
        assert!(html.contains("&lt;script&gt;alert("));
        assert!(html.contains("&amp; more"));
    }

    #[test]
    fn escapes_title_and_avatars() {
        let context = RenderContext {
            title: "Q&A \"notes\"".to_string(),
            user_avatar: "<b>".to_string(),
            ..RenderContext::default()
        };
        let bytes = HtmlRenderer
            .render(&[Message::user("hi")], &context)
            .expect("render");
        let html = String::from_utf8(bytes).expect("utf8");

        assert!(html.contains("<title>Q&amp;A &quot;notes&quot;</title>"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn applies_dark_palette() {
        let context = RenderContext {
            theme: Theme::Dark,
            ..RenderContext::default()
        };
        let bytes = HtmlRenderer
            .render(&[Message::assistant("ok")], &context)
            .expect("render");
        let html = String::from_utf8(bytes).expect("utf8");

        assert!(html.contains("data-theme=\"dark\""));
        assert!(html.contains("#1e1f22"));
        assert!(html.contains("class=\"message assistant\""));
    }
}
