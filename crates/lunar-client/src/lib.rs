pub mod api;
pub mod cache;
pub mod session;
pub mod types;

pub use api::{ApiClientError, LunarApi};
pub use cache::SummaryCache;
pub use session::ChatSession;
pub use types::{Chat, ChatSummary, ChatTurn, Message};
