use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    #[error("Chat {0} does not belong to the requesting user")]
    Forbidden(String),

    #[error("Invalid chat ID: {0}")]
    InvalidObjectId(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl StoreError {
    /// Whether the failure is a connectivity problem the caller may choose
    /// to degrade on, rather than a logical outcome like not-found.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
