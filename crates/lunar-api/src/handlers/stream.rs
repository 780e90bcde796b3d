use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

use lunar_llm::StreamEvent;

use crate::error::{ApiError, ApiResult};
use crate::routes::chat::{completion_request, persist_turn, prepare_turn, turn_headers, SendMessageRequest};
use crate::state::AppState;

/// Streaming chat turn: same prelude as the buffered endpoint, but the
/// reply is flushed to the client chunk by chunk as plain text.
///
/// Diagnostic headers go out before the first token, so the offline flag
/// reflects the state at generation start. Persistence happens after the
/// stream completes, from the accumulated text, and is still best-effort;
/// a mid-stream upstream error can only truncate the body, never change
/// the already-sent status.
pub async fn send_message_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Response> {
    let started = Instant::now();
    let ctx = prepare_turn(&state, req).await?;

    let request = completion_request(&state.config, ctx.messages.clone());
    let mut upstream = state
        .llm
        .generate_stream(request)
        .await
        .map_err(ApiError::Upstream)?;

    let mut headers = turn_headers(&ctx, started);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );

    let body = Body::from_stream(async_stream::stream! {
        let mut full_reply = String::new();

        while let Some(event) = upstream.next().await {
            match event {
                Ok(StreamEvent::Delta { text }) => {
                    full_reply.push_str(&text);
                    yield Ok::<_, std::convert::Infallible>(Bytes::from(text));
                }
                Ok(StreamEvent::Done { .. }) => break,
                Err(e) => {
                    tracing::error!(chat_id = %ctx.chat_id, "stream aborted mid-reply: {:#}", e);
                    break;
                }
            }
        }

        persist_turn(&ctx, &full_reply).await;
    });

    Ok((headers, body).into_response())
}
