use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use lunar_llm::{ChatMessage, ChatRole, CompletionOptions, CompletionRequest};
use lunar_persist::{derive_title, ChatStore, StoreError, StoredMessage};

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::normalize::normalize_messages;
use crate::prompt::LUNAR_SYSTEM_PROMPT;
use crate::routes::require_user;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Chat to continue; absent or stale ids start a fresh conversation.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Value>,
}

/// Everything a chat turn needs after the shared prelude: who is asking,
/// which conversation this lands in, the normalized history, and a store
/// handle when (and only when) the turn runs online.
pub(crate) struct TurnContext {
    pub user_id: String,
    pub chat_id: String,
    pub messages: Vec<ChatMessage>,
    pub store: Option<ChatStore>,
    pub title: String,
}

impl TurnContext {
    pub fn offline(&self) -> bool {
        self.store.is_none()
    }
}

/// Shared prelude of both chat endpoints: validate, connect (or degrade),
/// normalize, resolve the target chat. Only validation and normalization
/// failures abort the turn; a dead database never does.
pub(crate) async fn prepare_turn(
    state: &AppState,
    req: SendMessageRequest,
) -> ApiResult<TurnContext> {
    let user_id = require_user(req.user_id)?;

    if req.messages.is_empty() {
        return Err(ApiError::Validation(
            "messages must be a non-empty array".to_string(),
        ));
    }
    if req.messages.iter().any(|m| !m.is_object()) {
        return Err(ApiError::Validation(
            "every message must be an object".to_string(),
        ));
    }

    let mut store = match state.gateway.connect().await {
        Ok(store) => Some(store.clone()),
        Err(e) => {
            tracing::warn!("database unavailable, continuing offline: {}", e);
            None
        }
    };

    let messages = normalize_messages(&req.messages).map_err(ApiError::MessageConversion)?;
    let title = derive_title(title_source(&messages));

    let mut chat_id = None;
    if let Some(ref s) = store {
        match resolve_chat(s, &user_id, req.id.as_deref(), &title).await {
            Ok(id) => chat_id = Some(id),
            Err(e) => {
                tracing::warn!("storage failed before generation, degrading to offline: {}", e);
                store = None;
            }
        }
    }

    // Offline turns still answer; they just can't persist. The client keeps
    // its id, or gets a throwaway timestamp one.
    let chat_id = chat_id.unwrap_or_else(|| {
        req.id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string())
    });

    Ok(TurnContext {
        user_id,
        chat_id,
        messages,
        store,
        title,
    })
}

/// Pick the text a new chat's title is derived from: first message, else
/// the latest user message.
fn title_source(messages: &[ChatMessage]) -> &str {
    if let Some(first) = messages.first() {
        if !first.content.trim().is_empty() {
            return &first.content;
        }
    }
    messages
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// Resolve which chat document receives this turn. A requested id that is
/// missing, malformed, or owned by someone else starts a fresh chat instead
/// of failing the turn; only infrastructure errors bubble up (and degrade
/// the caller to offline).
async fn resolve_chat(
    store: &ChatStore,
    user_id: &str,
    requested: Option<&str>,
    title: &str,
) -> Result<String, StoreError> {
    if let Some(id) = requested.filter(|id| !id.is_empty()) {
        match store.get_chat(id, user_id).await {
            Ok(doc) => return Ok(doc.id.to_hex()),
            Err(
                StoreError::ChatNotFound(_)
                | StoreError::InvalidObjectId(_)
                | StoreError::Forbidden(_),
            ) => {
                tracing::debug!(chat_id = %id, "requested chat unusable, starting a fresh one");
            }
            Err(e) => return Err(e),
        }
    }

    let doc = store.create_chat(user_id, Some(title.to_string())).await?;
    Ok(doc.id.to_hex())
}

pub(crate) fn completion_request(config: &Config, messages: Vec<ChatMessage>) -> CompletionRequest {
    CompletionRequest::new(&config.llm.model, LUNAR_SYSTEM_PROMPT, messages).with_options(
        CompletionOptions::new()
            .temperature(config.llm.temperature)
            .max_output_tokens(config.llm.max_output_tokens),
    )
}

/// Best-effort persistence of a finished turn: the user's latest message and
/// the assistant's reply, appended atomically. The reply has already been
/// delivered (or is being streamed), so failure here is logged and swallowed.
pub(crate) async fn persist_turn(ctx: &TurnContext, reply: &str) {
    let Some(store) = &ctx.store else {
        return;
    };
    let Some(last) = ctx.messages.last() else {
        return;
    };

    let turn = vec![
        StoredMessage::new(ChatRole::User, last.content.clone()),
        StoredMessage::new(ChatRole::Assistant, reply),
    ];

    if let Err(e) = store
        .append_messages(&ctx.chat_id, turn, Some(&ctx.title))
        .await
    {
        tracing::warn!(user = %ctx.user_id, chat_id = %ctx.chat_id, "failed to persist chat turn: {}", e);
    }
}

/// Diagnostic headers every turn response carries so clients can tell an
/// offline answer from a persisted one.
pub(crate) fn turn_headers(ctx: &TurnContext, started: Instant) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(&ctx.chat_id) {
        headers.insert("x-chat-id", value);
    }
    headers.insert(
        "x-lunar-offline",
        HeaderValue::from_static(if ctx.offline() { "true" } else { "false" }),
    );
    headers.insert(
        "x-db-status",
        HeaderValue::from_static(if ctx.offline() { "offline" } else { "connected" }),
    );
    if let Ok(value) = HeaderValue::from_str(&started.elapsed().as_millis().to_string()) {
        headers.insert("x-request-time", value);
    }

    headers
}

/// Buffered chat turn: run the whole pipeline, answer once.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Response> {
    let started = Instant::now();
    let ctx = prepare_turn(&state, req).await?;

    let request = completion_request(&state.config, ctx.messages.clone());
    let completion = state.llm.generate(request).await.map_err(ApiError::Upstream)?;

    persist_turn(&ctx, &completion.text).await;

    tracing::info!(
        user = %ctx.user_id,
        chat_id = %ctx.chat_id,
        offline = ctx.offline(),
        "chat turn completed"
    );

    let mut headers = turn_headers(&ctx, started);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    let body = Json(json!({
        "chatId": ctx.chat_id,
        "message": {
            "role": "assistant",
            "content": completion.text,
        }
    }));

    Ok((headers, body).into_response())
}
