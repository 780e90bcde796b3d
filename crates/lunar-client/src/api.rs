use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::types::{Chat, ChatSummary, ChatTurn, Message};

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

type Result<T> = std::result::Result<T, ApiClientError>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatTurnBody {
    chat_id: String,
    message: Message,
}

#[derive(Debug, Deserialize)]
struct RenameBody {
    title: String,
}

/// Thin wrapper over the Lunar Liao HTTP surface.
pub struct LunarApi {
    http: reqwest::Client,
    base_url: String,
}

impl LunarApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Send one chat turn. The full visible message list travels with the
    /// request; the server decides online vs. offline and reports it back
    /// through the diagnostic headers.
    pub async fn send_message(
        &self,
        user_id: &str,
        chat_id: Option<&str>,
        messages: &[Message],
    ) -> Result<ChatTurn> {
        let mut body = json!({
            "userId": user_id,
            "messages": messages,
        });
        if let Some(id) = chat_id {
            body["id"] = json!(id);
        }

        let response = self
            .http
            .post(format!("{}/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let offline = header_str(&response, "X-Lunar-Offline") == Some("true".into());
        let db_status =
            header_str(&response, "X-DB-Status").unwrap_or_else(|| "unknown".to_string());

        let body: ChatTurnBody = check(response).await?.json().await?;
        Ok(ChatTurn {
            chat_id: body.chat_id,
            message: body.message,
            offline,
            db_status,
        })
    }

    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatSummary>> {
        let response = self
            .http
            .get(format!("{}/chats", self.base_url))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn create_chat(&self, user_id: &str, title: Option<&str>) -> Result<Chat> {
        let mut body = json!({ "userId": user_id });
        if let Some(title) = title {
            body["title"] = json!(title);
        }
        let response = self
            .http
            .post(format!("{}/chats", self.base_url))
            .json(&body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn get_chat(&self, id: &str, user_id: &str) -> Result<Chat> {
        let response = self
            .http
            .get(format!("{}/chats/{}", self.base_url, id))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete_chat(&self, id: &str, user_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/chats/{}", self.base_url, id))
            .query(&[("userId", user_id)])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn rename_chat(&self, id: &str, user_id: &str, title: &str) -> Result<String> {
        let response = self
            .http
            .patch(format!("{}/chats/{}", self.base_url, id))
            .query(&[("userId", user_id)])
            .json(&json!({ "title": title }))
            .send()
            .await?;
        let body: RenameBody = check(response).await?.json().await?;
        Ok(body.title)
    }
}

fn header_str(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Turn non-2xx responses into `ApiClientError::Api` with the server's
/// human-readable `error` field when present.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ApiClientError::Api { status, message })
}
