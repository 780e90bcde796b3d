mod client;
pub mod responses;

pub use client::GeminiClient;
