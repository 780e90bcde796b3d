use std::sync::Arc;

use lunar_llm::CompletionClient;
use lunar_persist::DbGateway;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The database gateway is lazy: it holds no connection until a handler
/// first asks for one, and a failed attempt leaves it retryable. The
/// completion client is behind a trait object so tests can substitute a
/// scripted model.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<DbGateway>,
    pub llm: Arc<dyn CompletionClient>,
}

impl AppState {
    pub fn new(config: Config, gateway: DbGateway, llm: Arc<dyn CompletionClient>) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            llm,
        }
    }
}
