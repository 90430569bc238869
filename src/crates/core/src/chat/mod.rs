//! Conversation model and streaming
//!
//! Message types, context window selection, the streaming assembler and the
//! session state machine that ties them together.

pub mod assembler;
pub mod context;
pub mod events;
pub mod message;
pub mod session;

pub use assembler::{run_stream, StreamAssembler, StreamOutcome, StreamRequest};
pub use context::{ContextWindow, DEFAULT_CONTEXT_MESSAGES, DEFAULT_SYSTEM_PROMPT};
pub use events::ChatEvent;
pub use message::{Message, MessageRole, WireMessage};
pub use session::{ChatPhase, ChatSession};
