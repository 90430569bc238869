//! Error types

use thiserror::Error;

/// Message shown whenever an action needs at least one message in the history.
pub const EMPTY_CONVERSATION_WARNING: &str = "No question and answer content available";

#[derive(Debug, Error)]
pub enum LightChatError {
    #[error("{}", EMPTY_CONVERSATION_WARNING)]
    EmptyConversation,

    #[error("A response is still streaming; stop it before sending another message")]
    RequestInFlight,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Service(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl LightChatError {
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Warnings are user-recoverable conditions shown as a toast, not a banner.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::EmptyConversation | Self::RequestInFlight)
    }
}

pub type LightChatResult<T> = Result<T, LightChatError>;
