use std::collections::VecDeque;
use std::pin::Pin;

use anyhow::Result;
use futures::{Stream, StreamExt};
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::gemini::responses::GenerateContentResponse;
use crate::traits::TokenUsage;

/// Events yielded by a streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text chunk
    Delta { text: String },

    /// End of generation, with the final metadata the provider reported
    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<TokenUsage>,
    },
}

/// Parse a Gemini `streamGenerateContent?alt=sse` response into stream events.
///
/// Chunks arrive as `data: {GenerateContentResponse}` lines; the final chunk
/// carries the finish reason and usage metadata. If the connection closes
/// without one, a synthetic `Done` is emitted so consumers always see a
/// terminal event.
pub fn parse_sse_stream(
    response: Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>> {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = VecDeque::with_capacity(8192);
        let mut done_emitted = false;

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes);

                    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

                        if let Ok(line_str) = std::str::from_utf8(&line_bytes) {
                            let line = line_str.trim();

                            if line.is_empty() {
                                continue;
                            }

                            if let Some(data) = line.strip_prefix("data: ") {
                                match serde_json::from_str::<GenerateContentResponse>(data) {
                                    Ok(chunk) => {
                                        let text = chunk.text();
                                        if !text.is_empty() {
                                            yield Ok(StreamEvent::Delta { text });
                                        }

                                        if let Some(finish_reason) = chunk.finish_reason() {
                                            done_emitted = true;
                                            yield Ok(StreamEvent::Done {
                                                finish_reason: Some(finish_reason),
                                                usage: chunk.token_usage(),
                                            });
                                        }
                                    }
                                    Err(e) => yield Err(anyhow::anyhow!("Failed to parse stream chunk: {}", e)),
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
            }
        }

        if !done_emitted {
            yield Ok(StreamEvent::Done { finish_reason: None, usage: None });
        }
    })
}
