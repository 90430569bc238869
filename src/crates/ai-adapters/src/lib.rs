//! Provider adapters shared by the LightChat proxy.
//!
//! - [`request`]: the chat-completions request body sent upstream
//! - [`types`]: SSE payload types and the provider-neutral [`UnifiedResponse`]
//! - [`stream_handler`]: turns an upstream SSE body into [`UnifiedResponse`] events

pub mod request;
pub mod stream_handler;
pub mod types;

pub use request::{ChatCompletionRequest, ChatMessagePayload};
pub use stream_handler::{extract_sse_api_error_message, handle_openai_stream};
pub use types::unified::{UnifiedResponse, UnifiedTokenUsage};
