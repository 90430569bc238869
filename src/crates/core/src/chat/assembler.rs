//! Streaming response assembly
//!
//! [`StreamAssembler`] turns raw body chunks into text, and [`run_stream`]
//! drives one request from connect to archive, racing every read against the
//! request's cancellation token.

use super::events::ChatEvent;
use super::message::Message;
use crate::client::ChatTransport;
use futures::StreamExt;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Incremental UTF-8 decoder plus the accumulating answer buffer.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    buffer: String,
    /// Trailing bytes of an incomplete multi-byte sequence.
    pending: Vec<u8>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Decode `chunk` and append it. Returns the appended text, or `None` when
    /// nothing visible changed (incomplete sequence, empty chunk, or a lone
    /// newline right after a trailing newline).
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(chunk);
        let decoded = self.decode_pending();
        self.append(decoded)
    }

    /// Flush any incomplete trailing bytes lossily and return the final text.
    pub fn finish(mut self) -> String {
        if !self.pending.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            let _ = self.append(rest);
        }
        self.buffer
    }

    fn append(&mut self, decoded: String) -> Option<String> {
        if decoded.is_empty() {
            return None;
        }
        if decoded == "\n" && self.buffer.ends_with('\n') {
            return None;
        }
        self.buffer.push_str(&decoded);
        Some(decoded)
    }

    fn decode_pending(&mut self) -> String {
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes.
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }
}

/// One request handed to [`run_stream`].
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub request_id: u64,
    pub messages: Vec<Message>,
    pub api_key: Option<String>,
    pub cancel: CancellationToken,
}

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed(String),
    Cancelled(String),
    Failed(String),
}

impl StreamOutcome {
    fn into_event(self, request_id: u64) -> ChatEvent {
        match self {
            StreamOutcome::Completed(content) => ChatEvent::Completed { request_id, content },
            StreamOutcome::Cancelled(content) => ChatEvent::Cancelled { request_id, content },
            StreamOutcome::Failed(message) => ChatEvent::Failed { request_id, message },
        }
    }
}

/// Drive one request to its end, reporting progress on `tx`.
///
/// The terminal event is always the last one sent. A closed receiver is not
/// an error; the stream keeps assembling so the returned outcome stays exact.
pub async fn run_stream(
    transport: Arc<dyn ChatTransport>,
    request: StreamRequest,
    tx: mpsc::UnboundedSender<ChatEvent>,
) -> StreamOutcome {
    let request_id = request.request_id;
    let outcome = assemble(transport, &request, &tx).await;
    debug!(
        "Stream finished: request_id={}, outcome={}",
        request_id,
        match &outcome {
            StreamOutcome::Completed(_) => "completed",
            StreamOutcome::Cancelled(_) => "cancelled",
            StreamOutcome::Failed(_) => "failed",
        }
    );
    let _ = tx.send(outcome.clone().into_event(request_id));
    outcome
}

async fn assemble(
    transport: Arc<dyn ChatTransport>,
    request: &StreamRequest,
    tx: &mpsc::UnboundedSender<ChatEvent>,
) -> StreamOutcome {
    let request_id = request.request_id;
    let cancel = &request.cancel;

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return StreamOutcome::Cancelled(String::new()),
        opened = transport.open_stream(request.api_key.as_deref(), &request.messages) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Chat request failed: request_id={}, error={}", request_id, e);
            return StreamOutcome::Failed(e.to_string());
        }
    };
    let _ = tx.send(ChatEvent::Started { request_id });

    let mut assembler = StreamAssembler::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamOutcome::Cancelled(assembler.finish()),
            next = stream.next() => next,
        };
        match next {
            Some(Ok(chunk)) => {
                if let Some(text) = assembler.push_chunk(&chunk) {
                    let _ = tx.send(ChatEvent::Delta { request_id, text });
                }
            }
            Some(Err(e)) => {
                if cancel.is_cancelled() {
                    // The aborted transport surfaces as a read error; keep what arrived.
                    return StreamOutcome::Cancelled(assembler.finish());
                }
                warn!("Chat stream read failed: request_id={}, error={}", request_id, e);
                return StreamOutcome::Failed(e.to_string());
            }
            None => return StreamOutcome::Completed(assembler.finish()),
        }
    }
}
