//! HTTP side of the client
//!
//! The chat transport used by the streaming assembler, the fallback API key
//! fetch, and [`ChatClient`] which spawns one stream task per request.

pub mod api_key;
pub mod transport;

pub use api_key::{fetch_available_api_key, resolve_api_key, AvailableApiKey, AVAILABLE_API_KEY_PATH};
pub use transport::{error_message_from_response, ChatTransport, ChunkStream, ProxyTransport};

use crate::chat::assembler::{run_stream, StreamRequest};
use crate::chat::events::ChatEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawns stream tasks that report back on a single event channel.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
    tx_event: mpsc::UnboundedSender<ChatEvent>,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn ChatTransport>) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx_event, rx_event) = mpsc::unbounded_channel();
        (Self { transport, tx_event }, rx_event)
    }

    pub fn spawn(&self, request: StreamRequest) -> JoinHandle<()> {
        let transport = self.transport.clone();
        let tx = self.tx_event.clone();
        tokio::spawn(async move {
            let _ = run_stream(transport, request, tx).await;
        })
    }
}
