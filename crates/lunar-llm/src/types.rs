use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conversation roles accepted on the wire.
///
/// `Data` is carried for compatibility with the front end's message shapes;
/// the provider only distinguishes user and model turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Data,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            "data" => Ok(Self::Data),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Canonical role/content pair, the only message shape that crosses the
/// completion boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serde_is_lowercase() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");

        let role: ChatRole = serde_json::from_str("\"data\"").unwrap();
        assert_eq!(role, ChatRole::Data);
    }

    #[test]
    fn role_from_str_rejects_unknown() {
        assert_eq!("user".parse::<ChatRole>().unwrap(), ChatRole::User);
        assert!("tool".parse::<ChatRole>().is_err());
    }

    #[test]
    fn message_constructors() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, ChatRole::User);
        assert_eq!(msg.content, "hello");
        assert_eq!(ChatMessage::assistant("hi").role, ChatRole::Assistant);
    }
}
