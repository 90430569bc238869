//! Conversation export
//!
//! Renders the visible conversation into a standalone document and writes it
//! next to the user's other downloads.

mod html;
mod json;
mod layout;
mod markdown;
mod pdf;
mod png;

pub use html::HtmlRenderer;
pub use json::JsonRenderer;
pub use markdown::MarkdownRenderer;
pub use pdf::PdfRenderer;
pub use png::PngRenderer;

use crate::chat::message::{Message, MessageRole};
use crate::settings::Theme;
use crate::util::errors::{LightChatError, LightChatResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Html,
    Json,
    Png,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Markdown,
        ExportFormat::Html,
        ExportFormat::Json,
        ExportFormat::Png,
        ExportFormat::Pdf,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn renderer(&self) -> Box<dyn ConversationRenderer> {
        match self {
            ExportFormat::Markdown => Box::new(MarkdownRenderer),
            ExportFormat::Html => Box::new(HtmlRenderer),
            ExportFormat::Json => Box::new(JsonRenderer),
            ExportFormat::Png => Box::new(PngRenderer),
            ExportFormat::Pdf => Box::new(PdfRenderer),
        }
    }
}

/// Presentation details that the rendered document should reflect.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub title: String,
    pub theme: Theme,
    pub user_avatar: String,
    pub robot_avatar: String,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            title: "LightChat".to_string(),
            theme: Theme::Light,
            user_avatar: crate::settings::DEFAULT_USER_AVATAR.to_string(),
            robot_avatar: crate::settings::DEFAULT_ROBOT_AVATAR.to_string(),
        }
    }
}

impl RenderContext {
    pub fn avatar_for(&self, role: MessageRole) -> &str {
        match role {
            MessageRole::User => &self.user_avatar,
            _ => &self.robot_avatar,
        }
    }
}

pub trait ConversationRenderer {
    fn format(&self) -> ExportFormat;

    /// Render `messages` (never empty, system messages already removed).
    fn render(&self, messages: &[Message], context: &RenderContext) -> LightChatResult<Vec<u8>>;
}

/// Render the conversation and write it into `dir`.
///
/// With no visible messages this returns the empty-conversation warning and
/// the renderer is never called.
pub fn export_conversation(
    messages: &[Message],
    renderer: &dyn ConversationRenderer,
    context: &RenderContext,
    dir: &Path,
) -> LightChatResult<PathBuf> {
    let visible: Vec<Message> = messages.iter().filter(|m| !m.is_system()).cloned().collect();
    if visible.is_empty() {
        return Err(LightChatError::EmptyConversation);
    }

    let bytes = renderer.render(&visible, context)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(renderer.format()));
    std::fs::write(&path, bytes)?;

    info!(
        "Conversation exported: format={:?}, messages={}, path={}",
        renderer.format(),
        visible.len(),
        path.display()
    );
    Ok(path)
}

/// `<unix-millis>dialog_list.<ext>`
pub fn export_file_name(format: ExportFormat) -> String {
    format!(
        "{}dialog_list.{}",
        chrono::Utc::now().timestamp_millis(),
        format.extension()
    )
}

/// Where exports go when the caller does not choose: the download dir, else
/// the current directory.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
