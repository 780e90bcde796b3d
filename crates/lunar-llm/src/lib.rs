pub mod types;
pub mod traits;
pub mod streaming;
pub mod gemini;

pub use traits::{
    CompletionClient,
    CompletionRequest, CompletionOptions, Completion,
    TokenUsage,
};

pub use streaming::StreamEvent;
pub use types::{ChatMessage, ChatRole};
pub use gemini::GeminiClient;
