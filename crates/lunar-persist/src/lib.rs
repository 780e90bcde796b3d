pub mod error;
pub mod gateway;
pub mod models;
pub mod store;

pub use error::StoreError;
pub use gateway::DbGateway;
pub use models::{
    derive_title, Chat, ChatDocument, ChatSummary, Message, StoredMessage,
    DERIVED_TITLE_MAX_CHARS, PLACEHOLDER_TITLE, RENAME_TITLE_MAX_CHARS,
};
pub use store::{ChatStore, DEFAULT_LIST_LIMIT};
