use bson::doc;
use mongodb::Client;
use tokio::sync::OnceCell;

use crate::error::{Result, StoreError};
use crate::store::ChatStore;

/// Process-wide cached database connection.
///
/// The first `connect` call establishes the connection; concurrent first
/// callers all await that single in-flight attempt. A failed attempt leaves
/// the cell empty so the next call retries, and callers are expected to
/// treat failure as "degrade to offline", not as a fatal condition.
pub struct DbGateway {
    uri: String,
    db_name: String,
    store: OnceCell<ChatStore>,
}

impl DbGateway {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            store: OnceCell::new(),
        }
    }

    /// Connect lazily and return the cached store handle
    pub async fn connect(&self) -> Result<&ChatStore> {
        self.store
            .get_or_try_init(|| async {
                tracing::debug!(db = %self.db_name, "establishing MongoDB connection");
                let client = Client::with_uri_str(&self.uri)
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;

                // The driver connects lazily; ping so an unreachable server
                // surfaces here instead of on the first real query.
                client
                    .database(&self.db_name)
                    .run_command(doc! { "ping": 1 })
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;

                tracing::info!(db = %self.db_name, "MongoDB connected");
                Ok(ChatStore::new(&client, &self.db_name))
            })
            .await
    }

    /// Whether a connection has been established at some point
    pub fn is_connected(&self) -> bool {
        self.store.initialized()
    }
}
