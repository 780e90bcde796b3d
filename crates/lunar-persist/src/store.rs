use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{Client, Collection, Database};
use serde::Deserialize;

use crate::error::{Result, StoreError};
use crate::models::{
    ChatDocument, ChatSummary, StoredMessage, DERIVED_TITLE_MAX_CHARS, PLACEHOLDER_TITLE,
    RENAME_TITLE_MAX_CHARS,
};

/// Default cap on list results.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// CRUD over the `chats` collection. One document per conversation,
/// messages embedded; `user_id` is the sole authorization check.
#[derive(Clone)]
pub struct ChatStore {
    db: Database,
    chats: Collection<ChatDocument>,
}

#[derive(Debug, Deserialize)]
struct SummaryRow {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    title: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
    #[serde(default)]
    message_count: i64,
}

impl ChatStore {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        let chats = db.collection("chats");
        Self { db, chats }
    }

    /// Round-trip to the server to confirm the connection is alive
    pub async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Create a new chat with an empty message list
    pub async fn create_chat(&self, user_id: &str, title: Option<String>) -> Result<ChatDocument> {
        let now = Utc::now();
        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => PLACEHOLDER_TITLE.to_string(),
        };

        let chat = ChatDocument {
            id: ObjectId::new(),
            user_id: user_id.to_string(),
            title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.chats.insert_one(&chat).await?;
        tracing::debug!(chat_id = %chat.id, user_id, "chat created");
        Ok(chat)
    }

    /// Fetch a chat, verifying ownership. A mismatched owner is a distinct
    /// outcome from a missing document.
    pub async fn get_chat(&self, id: &str, user_id: &str) -> Result<ChatDocument> {
        let oid = Self::parse_id(id)?;
        let chat = self
            .chats
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| StoreError::ChatNotFound(id.to_string()))?;

        if chat.user_id != user_id {
            return Err(StoreError::Forbidden(id.to_string()));
        }
        Ok(chat)
    }

    /// List chat summaries for a user, newest-updated first. Message bodies
    /// stay on the server; only the count is projected.
    pub async fn list_chats(&self, user_id: &str, limit: i64) -> Result<Vec<ChatSummary>> {
        let limit = limit.clamp(1, DEFAULT_LIST_LIMIT);
        let pipeline = vec![
            doc! { "$match": { "user_id": user_id } },
            doc! { "$sort": { "updated_at": -1 } },
            doc! { "$limit": limit },
            doc! { "$project": {
                "title": 1,
                "created_at": 1,
                "updated_at": 1,
                "message_count": { "$size": "$messages" },
            } },
        ];

        let rows: Vec<Document> = self.chats.aggregate(pipeline).await?.try_collect().await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let row: SummaryRow = bson::from_document(row)?;
            summaries.push(ChatSummary {
                id: row.id.to_hex(),
                title: row.title,
                created_at: row.created_at,
                updated_at: row.updated_at,
                message_count: row.message_count.max(0) as u64,
            });
        }
        Ok(summaries)
    }

    /// Atomically append messages and bump `updated_at`. When
    /// `title_if_placeholder` is given, the title is set only if the stored
    /// one is still the placeholder (or empty).
    pub async fn append_messages(
        &self,
        id: &str,
        messages: Vec<StoredMessage>,
        title_if_placeholder: Option<&str>,
    ) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let oid = Self::parse_id(id)?;

        if let Some(title) = title_if_placeholder {
            self.chats
                .update_one(
                    doc! { "_id": oid, "title": { "$in": ["", PLACEHOLDER_TITLE] } },
                    doc! { "$set": { "title": title } },
                )
                .await?;
        }

        let docs: Vec<bson::Bson> = messages
            .iter()
            .map(bson::to_bson)
            .collect::<std::result::Result<_, _>>()?;

        let result = self
            .chats
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$push": { "messages": { "$each": docs } },
                    "$set": { "updated_at": bson::DateTime::now() },
                },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::ChatNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Rename a chat, enforcing ownership and the explicit-title cap
    pub async fn rename_chat(
        &self,
        id: &str,
        user_id: &str,
        new_title: &str,
    ) -> Result<ChatDocument> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidTitle("title must not be empty".into()));
        }
        if title.chars().count() > RENAME_TITLE_MAX_CHARS {
            return Err(StoreError::InvalidTitle(format!(
                "title must be at most {} characters",
                RENAME_TITLE_MAX_CHARS
            )));
        }

        // Ownership check first so forbidden and not-found stay distinct
        let mut chat = self.get_chat(id, user_id).await?;

        let now = bson::DateTime::now();
        self.chats
            .update_one(
                doc! { "_id": chat.id, "user_id": user_id },
                doc! { "$set": { "title": title, "updated_at": now } },
            )
            .await?;

        chat.title = title.to_string();
        chat.updated_at = now.to_chrono();
        Ok(chat)
    }

    /// Owner-scoped delete; a wrong owner matches nothing and reads as a
    /// miss rather than a forbidden outcome.
    pub async fn delete_chat(&self, id: &str, user_id: &str) -> Result<bool> {
        let oid = Self::parse_id(id)?;
        let result = self
            .chats
            .delete_one(doc! { "_id": oid, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    fn parse_id(id: &str) -> Result<ObjectId> {
        ObjectId::parse_str(id).map_err(|_| StoreError::InvalidObjectId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_ids_are_rejected_before_any_query() {
        let err = ChatStore::parse_id("1735689600000").unwrap_err();
        assert!(matches!(err, StoreError::InvalidObjectId(_)));

        let valid = ObjectId::new().to_hex();
        assert!(ChatStore::parse_id(&valid).is_ok());
    }

    #[test]
    fn derived_title_limit_is_below_rename_cap() {
        assert!(DERIVED_TITLE_MAX_CHARS < RENAME_TITLE_MAX_CHARS);
    }
}
