//! Fixed-width text layout shared by the raster and PDF renderers.

use super::RenderContext;
use crate::chat::message::{Message, MessageRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LineKind {
    Title,
    Speaker,
    Body,
    Gap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TextLine {
    pub kind: LineKind,
    /// Owner of the line; `None` for the title and separators.
    pub role: Option<MessageRole>,
    pub text: String,
}

impl TextLine {
    fn new(kind: LineKind, role: Option<MessageRole>, text: impl Into<String>) -> Self {
        Self {
            kind,
            role,
            text: text.into(),
        }
    }
}

pub(super) fn speaker_label(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "You",
        MessageRole::Assistant => "Assistant",
        MessageRole::System => "System",
    }
}

/// Lay the conversation out as lines of at most `columns` characters.
pub(super) fn layout_conversation(
    messages: &[Message],
    context: &RenderContext,
    columns: usize,
) -> Vec<TextLine> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    for title_line in wrap(&context.title, columns) {
        lines.push(TextLine::new(LineKind::Title, None, title_line));
    }
    lines.push(TextLine::new(LineKind::Gap, None, ""));

    for message in messages {
        let role = Some(message.role);
        lines.push(TextLine::new(LineKind::Speaker, role, speaker_label(message.role)));
        for paragraph in message.content.trim_end().split('\n') {
            let paragraph = paragraph.replace('\t', "    ");
            for body_line in wrap(paragraph.trim_end(), columns) {
                lines.push(TextLine::new(LineKind::Body, role, body_line));
            }
        }
        lines.push(TextLine::new(LineKind::Gap, None, ""));
    }
    lines
}

/// Greedy word wrap by character count. Words longer than a line are split.
/// An empty input yields one empty line so blank paragraphs keep their space.
pub(super) fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split(' ') {
        let mut word: Vec<char> = word.chars().collect();
        let needed = if current_len == 0 { word.len() } else { word.len() + 1 };
        if current_len > 0 && current_len + needed > columns {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        while current_len + word.len() > columns {
            let room = columns - current_len;
            current.extend(word.drain(..room));
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += word.len();
        current.extend(word);
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
    }

    #[test]
    fn conversation_layout_labels_each_message() {
        let messages = vec![Message::user("Hi\n\nthere"), Message::assistant("Hello")];
        let lines = layout_conversation(&messages, &RenderContext::default(), 40);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["LightChat", "", "You", "Hi", "", "there", "", "Assistant", "Hello", ""]
        );
        assert_eq!(lines[2].kind, LineKind::Speaker);
        assert_eq!(lines[8].role, Some(MessageRole::Assistant));
    }
}
