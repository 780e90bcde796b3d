use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use lunar_persist::{Chat, ChatSummary, DEFAULT_LIST_LIMIT};

use crate::error::{ApiError, ApiResult};
use crate::routes::require_user;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameChatRequest {
    pub title: String,
}

/// List the caller's chats, newest activity first.
///
/// Summaries only: message bodies stay in the database to save bandwidth.
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<ChatSummary>>> {
    let user_id = require_user(query.user_id)?;
    let store = state.gateway.connect().await?;

    let summaries = store.list_chats(&user_id, DEFAULT_LIST_LIMIT).await?;
    Ok(Json(summaries))
}

/// Create an empty chat, optionally pre-titled.
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateChatRequest>,
) -> ApiResult<Json<Chat>> {
    let user_id = require_user(req.user_id)?;
    let store = state.gateway.connect().await?;

    let doc = store.create_chat(&user_id, req.title).await?;
    Ok(Json(doc.into()))
}

/// Fetch one chat with its full message history. Ownership is enforced:
/// someone else's chat is 403, a missing one 404.
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Chat>> {
    let user_id = require_user(query.user_id)?;
    let store = state.gateway.connect().await?;

    let doc = store.get_chat(&chat_id, &user_id).await?;
    Ok(Json(doc.into()))
}

/// Delete a chat. The delete is owner-scoped, so a wrong owner reads as a
/// miss rather than a forbidden outcome.
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Value>> {
    let user_id = require_user(query.user_id)?;
    let store = state.gateway.connect().await?;

    if store.delete_chat(&chat_id, &user_id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::NotFound(chat_id))
    }
}

/// Rename a chat (trimmed, 80-char cap enforced by the store).
pub async fn rename_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
    Query(query): Query<UserQuery>,
    Json(req): Json<RenameChatRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = require_user(query.user_id)?;
    let store = state.gateway.connect().await?;

    let chat = store.rename_chat(&chat_id, &user_id, &req.title).await?;
    Ok(Json(json!({ "success": true, "title": chat.title })))
}
