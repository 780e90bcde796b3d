use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use lunar_llm::ChatRole;
use serde::{Deserialize, Serialize};

/// Title a chat carries until a real one is derived or set.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Cap applied when a user renames a chat explicitly.
pub const RENAME_TITLE_MAX_CHARS: usize = 80;

/// Length of titles auto-derived from the first user message.
pub const DERIVED_TITLE_MAX_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Wire models (what the HTTP surface serializes)
// ---------------------------------------------------------------------------

/// A conversation as seen by API consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// List-view projection: message bodies excluded to save bandwidth, only
/// the count travels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u64,
}

// ---------------------------------------------------------------------------
// Document models (what MongoDB stores)
// ---------------------------------------------------------------------------

/// One document per conversation; messages are embedded, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub title: String,
    pub messages: Vec<StoredMessage>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

impl From<StoredMessage> for Message {
    fn from(msg: StoredMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            created_at: msg.created_at,
        }
    }
}

impl From<ChatDocument> for Chat {
    fn from(doc: ChatDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            user_id: doc.user_id,
            title: doc.title,
            messages: doc.messages.into_iter().map(Into::into).collect(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Title helpers
// ---------------------------------------------------------------------------

/// Derive a chat title from message text: first 50 characters, placeholder
/// when the text is empty.
pub fn derive_title(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return PLACEHOLDER_TITLE.to_string();
    }
    trimmed.chars().take(DERIVED_TITLE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_title_truncates_to_fifty_chars() {
        let long = "a".repeat(120);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), DERIVED_TITLE_MAX_CHARS);
    }

    #[test]
    fn derive_title_respects_char_boundaries() {
        let text = "é".repeat(60);
        let title = derive_title(&text);
        assert_eq!(title.chars().count(), DERIVED_TITLE_MAX_CHARS);
    }

    #[test]
    fn derive_title_defaults_to_placeholder() {
        assert_eq!(derive_title(""), PLACEHOLDER_TITLE);
        assert_eq!(derive_title("   "), PLACEHOLDER_TITLE);
    }

    #[test]
    fn derive_title_keeps_short_text() {
        assert_eq!(derive_title("Will I get a new job?"), "Will I get a new job?");
    }

    #[test]
    fn wire_models_serialize_camel_case() {
        let summary = ChatSummary {
            id: "abc".into(),
            title: "New Chat".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            message_count: 2,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("messageCount").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("message_count").is_none());
    }

    #[test]
    fn document_converts_to_wire_chat() {
        let doc = ChatDocument {
            id: ObjectId::new(),
            user_id: "0xabc".into(),
            title: "New Chat".into(),
            messages: vec![StoredMessage::new(ChatRole::User, "hello")],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let hex = doc.id.to_hex();
        let chat: Chat = doc.into();
        assert_eq!(chat.id, hex);
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].content, "hello");
    }
}
