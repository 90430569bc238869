//! Context window selection
//!
//! Each request carries a bounded tail of the history: the triggering message,
//! up to `prior_messages` messages before it, and exactly one system message
//! at the front.

use super::message::{Message, MessageRole};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a versatile expert, please answer each of my questions in a simple and easy-to-understand way as much as possible";

/// Prior messages sent alongside the triggering one.
pub const DEFAULT_CONTEXT_MESSAGES: usize = 3;

#[derive(Debug, Clone)]
pub struct ContextWindow {
    prior_messages: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_MESSAGES)
    }
}

impl ContextWindow {
    pub fn new(prior_messages: usize) -> Self {
        Self { prior_messages }
    }

    /// Build the message list for a request over `history`, whose last entry
    /// is the message that triggers the request.
    ///
    /// `system_role` is used when non-blank, otherwise [`DEFAULT_SYSTEM_PROMPT`].
    pub fn build(&self, history: &[Message], system_role: &Message) -> Vec<Message> {
        let keep = self.prior_messages + 1;
        let start = history.len().saturating_sub(keep);

        let mut window = Vec::with_capacity(keep + 1);
        window.push(effective_system_message(system_role));
        window.extend(
            history[start..]
                .iter()
                .filter(|message| !message.is_system())
                .cloned(),
        );
        window
    }
}

fn effective_system_message(system_role: &Message) -> Message {
    if system_role.content.trim().is_empty() {
        Message {
            id: system_role.id.clone(),
            role: MessageRole::System,
            content: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    } else {
        Message {
            role: MessageRole::System,
            ..system_role.clone()
        }
    }
}
