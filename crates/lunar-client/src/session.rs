use crate::types::{Chat, ChatTurn, Message};

/// View model for the active conversation.
///
/// Sends are optimistic: the user's message is appended before the server
/// answers, and a failed turn keeps it in place alongside a dismissible
/// error so nothing the user typed is lost.
#[derive(Debug, Default)]
pub struct ChatSession {
    chat_id: Option<String>,
    messages: Vec<Message>,
    error: Option<String>,
    pending: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Replace local state with a fetched conversation
    pub fn open(&mut self, chat: Chat) {
        self.chat_id = Some(chat.id);
        self.messages = chat.messages;
        self.error = None;
        self.pending = false;
    }

    /// Drop back to a fresh, unsaved conversation
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Optimistically append the outgoing user message and return the full
    /// list to submit to the server.
    pub fn begin_send(&mut self, content: impl Into<String>) -> Vec<Message> {
        self.error = None;
        self.pending = true;
        self.messages.push(Message::user(content));
        self.messages.clone()
    }

    /// Record a completed turn: adopt the server's chat id and append the
    /// assistant reply.
    pub fn complete_send(&mut self, turn: ChatTurn) {
        self.chat_id = Some(turn.chat_id);
        self.messages.push(turn.message);
        self.pending = false;
    }

    /// Record a failed turn. The optimistic user message stays so the user
    /// can retry without retyping.
    pub fn fail_send(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.pending = false;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn turn(chat_id: &str, content: &str) -> ChatTurn {
        ChatTurn {
            chat_id: chat_id.into(),
            message: Message::assistant(content),
            offline: false,
            db_status: "connected".into(),
        }
    }

    #[test]
    fn send_appends_optimistically_then_completes() {
        let mut session = ChatSession::new();

        let outgoing = session.begin_send("Will I get a new job?");
        assert_eq!(outgoing.len(), 1);
        assert!(session.is_pending());

        session.complete_send(turn("abc123", "The stars align."));
        assert_eq!(session.chat_id(), Some("abc123"));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].role, "assistant");
        assert!(!session.is_pending());
    }

    #[test]
    fn failed_send_keeps_user_message_and_surfaces_error() {
        let mut session = ChatSession::new();
        session.begin_send("hello?");
        session.fail_send("generation failed");

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.error(), Some("generation failed"));

        session.dismiss_error();
        assert!(session.error().is_none());
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn open_replaces_local_state() {
        let mut session = ChatSession::new();
        session.begin_send("draft");

        let now = Utc::now();
        session.open(Chat {
            id: "abc".into(),
            user_id: "0xabc".into(),
            title: "New Chat".into(),
            messages: vec![Message::user("earlier"), Message::assistant("reply")],
            created_at: now,
            updated_at: now,
        });

        assert_eq!(session.chat_id(), Some("abc"));
        assert_eq!(session.messages().len(), 2);
        assert!(!session.is_pending());
    }
}
