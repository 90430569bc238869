// LightChat Core Library - Platform-agnostic chat client logic
// Layers: Util -> Settings -> Chat -> Client -> Export

pub mod chat; // Conversation model, context window, streaming assembler, session
pub mod client; // Proxy transport, fallback API key, stream task spawning
pub mod config; // Client configuration
pub mod export; // Markdown/HTML/JSON/PNG/PDF conversation export
pub mod settings; // Local key-value settings
pub mod util; // Errors

// Export main types
pub use util::errors::*;

pub use chat::{
    ChatEvent, ChatPhase, ChatSession, ContextWindow, Message, MessageRole, StreamAssembler,
    StreamOutcome, StreamRequest,
};
pub use client::{ChatClient, ChatTransport, ProxyTransport};
pub use config::ClientConfig;
pub use export::{export_conversation, ConversationRenderer, ExportFormat, RenderContext};
pub use settings::{FileStore, KeyValueStore, MemoryStore, Preferences, Theme};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
