//! Conversation state container
//!
//! `ChatSession` is mutated only by the view loop. Starting a request returns a
//! [`StreamRequest`] for the caller to spawn; progress comes back as
//! [`ChatEvent`]s folded in by [`ChatSession::apply`].

use super::assembler::StreamRequest;
use super::context::ContextWindow;
use super::events::ChatEvent;
use super::message::Message;
use crate::util::errors::{LightChatError, LightChatResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    Idle,
    Requesting,
    Streaming,
    /// Stop was requested; waiting for the task to hand back the partial answer.
    Cancelling,
    Archived,
    Cancelled,
    Errored,
}

impl ChatPhase {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ChatPhase::Requesting | ChatPhase::Streaming | ChatPhase::Cancelling
        )
    }
}

#[derive(Debug)]
struct ActiveRequest {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<Message>,
    system_role: Message,
    draft: String,
    phase: ChatPhase,
    error_banner: Option<String>,
    context: ContextWindow,
    active: Option<ActiveRequest>,
    next_request_id: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(ContextWindow::default())
    }
}

impl ChatSession {
    pub fn new(context: ContextWindow) -> Self {
        Self {
            messages: Vec::new(),
            system_role: Message::system(""),
            draft: String::new(),
            phase: ChatPhase::Idle,
            error_banner: None,
            context,
            active: None,
            next_request_id: 1,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn system_role(&self) -> &Message {
        &self.system_role
    }

    /// Replace the system role. A fresh id marks it as a new persona.
    pub fn set_system_role(&mut self, content: impl Into<String>) {
        self.system_role = Message::system(content);
    }

    /// Append `prompt` as a user message and start a request for it.
    ///
    /// Blank prompts are ignored (`Ok(None)`).
    pub fn submit(
        &mut self,
        prompt: &str,
        api_key: Option<String>,
    ) -> LightChatResult<Option<StreamRequest>> {
        self.ensure_idle()?;
        if prompt.trim().is_empty() {
            return Ok(None);
        }
        self.messages.push(Message::user(prompt));
        Ok(Some(self.start_request(api_key)))
    }

    /// Ask again using the current history, without adding a user message.
    pub fn regenerate(&mut self, api_key: Option<String>) -> LightChatResult<StreamRequest> {
        self.ensure_idle()?;
        if self.messages.is_empty() {
            return Err(LightChatError::EmptyConversation);
        }
        Ok(self.start_request(api_key))
    }

    /// Cancel the in-flight request. The partial answer is archived when the
    /// stream task reports back. Returns `false` when nothing was running.
    pub fn stop(&mut self) -> bool {
        match (&self.active, self.phase) {
            (Some(active), phase) if phase.is_loading() => {
                info!("Stopping chat request: request_id={}", active.id);
                active.cancel.cancel();
                self.phase = ChatPhase::Cancelling;
                true
            }
            _ => false,
        }
    }

    /// Empty the history. Refuses with a warning when there is nothing to clear.
    pub fn clear_history(&mut self) -> LightChatResult<()> {
        if self.messages.is_empty() {
            return Err(LightChatError::EmptyConversation);
        }
        self.messages.clear();
        Ok(())
    }

    pub fn apply(&mut self, event: ChatEvent) {
        let Some(active_id) = self.active.as_ref().map(|active| active.id) else {
            debug!("Dropping chat event with no active request: {:?}", event.request_id());
            return;
        };
        if event.request_id() != active_id {
            debug!(
                "Dropping stale chat event: request_id={}, active_id={}",
                event.request_id(),
                active_id
            );
            return;
        }

        match event {
            ChatEvent::Started { .. } => {
                if self.phase == ChatPhase::Requesting {
                    self.phase = ChatPhase::Streaming;
                }
            }
            ChatEvent::Delta { text, .. } => {
                self.draft.push_str(&text);
                if self.phase == ChatPhase::Requesting {
                    self.phase = ChatPhase::Streaming;
                }
            }
            ChatEvent::Completed { content, .. } => {
                self.archive(content);
                self.phase = ChatPhase::Archived;
            }
            ChatEvent::Cancelled { content, .. } => {
                self.archive(content);
                self.phase = ChatPhase::Cancelled;
            }
            ChatEvent::Failed { message, .. } => {
                self.draft.clear();
                self.active = None;
                self.error_banner = Some(if message.trim().is_empty() {
                    "Service Error".to_string()
                } else {
                    message
                });
                self.phase = ChatPhase::Errored;
            }
        }
    }

    fn ensure_idle(&self) -> LightChatResult<()> {
        if self.is_loading() {
            return Err(LightChatError::RequestInFlight);
        }
        Ok(())
    }

    fn start_request(&mut self, api_key: Option<String>) -> StreamRequest {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let cancel = CancellationToken::new();
        self.active = Some(ActiveRequest {
            id: request_id,
            cancel: cancel.clone(),
        });
        self.error_banner = None;
        self.draft.clear();
        self.phase = ChatPhase::Requesting;

        StreamRequest {
            request_id,
            messages: self.context.build(&self.messages, &self.system_role),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            cancel,
        }
    }

    fn archive(&mut self, content: String) {
        if !content.is_empty() {
            self.messages.push(Message::assistant(content));
        }
        self.draft.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(session: &mut ChatSession, prompt: &str) -> StreamRequest {
        session
            .submit(prompt, Some("sk-test".to_string()))
            .expect("submit accepted")
            .expect("request started")
    }

    #[test]
    fn submit_appends_user_message_and_builds_window() {
        let mut session = ChatSession::default();
        let request = started(&mut session, "hello");

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.phase(), ChatPhase::Requesting);
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[0].is_system());
        assert_eq!(request.messages[1].content, "hello");
        assert_eq!(request.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn blank_prompt_is_ignored() {
        let mut session = ChatSession::default();
        assert!(session.submit("  \n", None).expect("no error").is_none());
        assert!(session.messages().is_empty());
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let mut session = ChatSession::default();
        let request = session
            .submit("hi", Some(" ".to_string()))
            .expect("accepted")
            .expect("started");
        assert!(request.api_key.is_none());
    }

    #[test]
    fn completed_stream_archives_answer() {
        let mut session = ChatSession::default();
        let request = started(&mut session, "hello");
        let id = request.request_id;

        session.apply(ChatEvent::Started { request_id: id });
        session.apply(ChatEvent::Delta { request_id: id, text: "Hi ".into() });
        session.apply(ChatEvent::Delta { request_id: id, text: "there".into() });
        assert_eq!(session.draft(), "Hi there");
        assert_eq!(session.phase(), ChatPhase::Streaming);

        session.apply(ChatEvent::Completed { request_id: id, content: "Hi there".into() });
        assert_eq!(session.phase(), ChatPhase::Archived);
        assert_eq!(session.draft(), "");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, "Hi there");
        assert!(!session.is_loading());
    }

    #[test]
    fn stop_archives_partial_answer() {
        let mut session = ChatSession::default();
        let request = started(&mut session, "hello");
        let id = request.request_id;
        session.apply(ChatEvent::Delta { request_id: id, text: "partial".into() });

        assert!(session.stop());
        assert!(request.cancel.is_cancelled());
        assert_eq!(session.phase(), ChatPhase::Cancelling);
        assert!(session.is_loading());

        session.apply(ChatEvent::Cancelled { request_id: id, content: "partial answer".into() });
        assert_eq!(session.phase(), ChatPhase::Cancelled);
        assert_eq!(session.messages().last().map(|m| m.content.as_str()), Some("partial answer"));
    }

    #[test]
    fn cancel_with_nothing_received_archives_nothing() {
        let mut session = ChatSession::default();
        let request = started(&mut session, "hello");
        session.stop();
        session.apply(ChatEvent::Cancelled { request_id: request.request_id, content: String::new() });
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_loading());
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let mut session = ChatSession::default();
        assert!(!session.stop());
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn failure_sets_banner_without_message() {
        let mut session = ChatSession::default();
        let request = started(&mut session, "hello");
        let id = request.request_id;
        session.apply(ChatEvent::Delta { request_id: id, text: "half".into() });
        session.apply(ChatEvent::Failed { request_id: id, message: "Too Many Requests".into() });

        assert_eq!(session.phase(), ChatPhase::Errored);
        assert_eq!(session.error_banner(), Some("Too Many Requests"));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.draft(), "");

        let _ = started(&mut session, "again");
        assert!(session.error_banner().is_none());
    }

    #[test]
    fn empty_failure_message_becomes_service_error() {
        let mut session = ChatSession::default();
        let request = started(&mut session, "hello");
        session.apply(ChatEvent::Failed { request_id: request.request_id, message: String::new() });
        assert_eq!(session.error_banner(), Some("Service Error"));
    }

    #[test]
    fn overlapping_request_is_rejected() {
        let mut session = ChatSession::default();
        let _ = started(&mut session, "first");

        let err = session.submit("second", None).expect_err("must reject");
        assert!(matches!(err, LightChatError::RequestInFlight));
        assert!(matches!(session.regenerate(None), Err(LightChatError::RequestInFlight)));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.phase(), ChatPhase::Requesting);
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut session = ChatSession::default();
        let first = started(&mut session, "first");
        session.apply(ChatEvent::Completed { request_id: first.request_id, content: "one".into() });

        let second = started(&mut session, "second");
        session.apply(ChatEvent::Delta { request_id: first.request_id, text: "late".into() });
        assert_eq!(session.draft(), "");
        session.apply(ChatEvent::Delta { request_id: second.request_id, text: "two".into() });
        assert_eq!(session.draft(), "two");
    }

    #[test]
    fn regenerate_reuses_history_without_new_user_message() {
        let mut session = ChatSession::default();
        let first = started(&mut session, "question");
        session.apply(ChatEvent::Completed { request_id: first.request_id, content: "answer".into() });

        let request = session.regenerate(None).expect("regenerate");
        assert_eq!(session.messages().len(), 2);
        let contents: Vec<_> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[1..], ["question", "answer"]);
    }

    #[test]
    fn regenerate_on_empty_history_warns() {
        let mut session = ChatSession::default();
        assert!(matches!(session.regenerate(None), Err(LightChatError::EmptyConversation)));
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn clear_on_empty_history_warns_and_changes_nothing() {
        let mut session = ChatSession::default();
        let before_phase = session.phase();
        assert!(matches!(session.clear_history(), Err(LightChatError::EmptyConversation)));
        assert!(session.messages().is_empty());
        assert_eq!(session.phase(), before_phase);
        assert!(session.error_banner().is_none());
    }

    #[test]
    fn clear_removes_all_messages() {
        let mut session = ChatSession::default();
        let request = started(&mut session, "q");
        session.apply(ChatEvent::Completed { request_id: request.request_id, content: "a".into() });
        session.clear_history().expect("clear");
        assert!(session.messages().is_empty());
    }

    #[test]
    fn custom_system_role_is_sent() {
        let mut session = ChatSession::default();
        session.set_system_role("You are a pirate");
        let request = started(&mut session, "hello");
        assert_eq!(request.messages[0].content, "You are a pirate");
    }
}
