/// Progress of one streaming request, sent from the stream task to the view.
///
/// Every event carries the id of the request that produced it so the session
/// can drop events from a request it no longer tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Response headers arrived; body chunks follow.
    Started { request_id: u64 },
    /// Newly decoded text to append to the draft.
    Delta { request_id: u64, text: String },
    /// Stream ended normally; `content` is the whole answer.
    Completed { request_id: u64, content: String },
    /// Request was cancelled; `content` is everything received before that.
    Cancelled { request_id: u64, content: String },
    /// Request failed; nothing is archived.
    Failed { request_id: u64, message: String },
}

impl ChatEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            ChatEvent::Started { request_id }
            | ChatEvent::Delta { request_id, .. }
            | ChatEvent::Completed { request_id, .. }
            | ChatEvent::Cancelled { request_id, .. }
            | ChatEvent::Failed { request_id, .. } => *request_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::Completed { .. } | ChatEvent::Cancelled { .. } | ChatEvent::Failed { .. }
        )
    }
}
