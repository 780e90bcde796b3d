// Google Generative AI client (HTTP direct, no SDK)

use crate::gemini::responses::GenerateContentResponse;
use crate::streaming::{parse_sse_stream, StreamEvent};
use crate::traits::{Completion, CompletionClient, CompletionOptions, CompletionRequest};
use crate::types::{ChatMessage, ChatRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::pin::Pin;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini client. The API key travels in the `x-goog-api-key` header; an
/// empty key is accepted at construction so the service can boot without
/// one, every call then fails upstream.
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the generateContent payload.
    ///
    /// Gemini only knows `user` and `model` turns: assistant maps to
    /// `model`, user and data map to `user`, and any system entries in the
    /// message list are hoisted into the system instruction alongside the
    /// fixed persona prompt.
    fn build_request(
        &self,
        system: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Value {
        let mut system_text = system.to_string();
        let mut contents: Vec<Value> = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role {
                ChatRole::System => {
                    if !system_text.is_empty() {
                        system_text.push_str("\n\n");
                    }
                    system_text.push_str(&message.content);
                }
                ChatRole::User | ChatRole::Data => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{ "text": message.content }],
                    }));
                }
                ChatRole::Assistant => {
                    contents.push(serde_json::json!({
                        "role": "model",
                        "parts": [{ "text": message.content }],
                    }));
                }
            }
        }

        let mut request = serde_json::json!({
            "contents": contents,
        });

        let obj = request.as_object_mut().unwrap();

        if !system_text.is_empty() {
            obj.insert(
                "systemInstruction".to_string(),
                serde_json::json!({ "parts": [{ "text": system_text }] }),
            );
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temp) = options.temperature {
            generation_config.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = options.max_output_tokens {
            generation_config.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
        }
        if !generation_config.is_empty() {
            obj.insert(
                "generationConfig".to_string(),
                Value::Object(generation_config),
            );
        }

        request
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn generate(&self, request: CompletionRequest) -> Result<Completion> {
        let payload = self.build_request(&request.system, &request.messages, &request.options);

        let response = self
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, request.model
            ))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let raw: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        Ok(Completion {
            text: raw.text(),
            finish_reason: raw.finish_reason(),
            usage: raw.token_usage(),
        })
    }

    async fn generate_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>> {
        let payload = self.build_request(&request.system, &request.messages, &request.options);

        let response = self
            .http_client
            .post(format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url, request.model
            ))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        Ok(parse_sse_stream(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new("test-key").unwrap()
    }

    #[test]
    fn assistant_maps_to_model_role() {
        let messages = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi there"),
        ];
        let payload = client().build_request("persona", &messages, &CompletionOptions::default());

        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "hi there");
        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "persona");
    }

    #[test]
    fn system_messages_are_hoisted() {
        let messages = vec![
            ChatMessage::new(ChatRole::System, "extra rules"),
            ChatMessage::user("hello"),
        ];
        let payload = client().build_request("persona", &messages, &CompletionOptions::default());

        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        let system = payload["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap();
        assert!(system.starts_with("persona"));
        assert!(system.contains("extra rules"));
    }

    #[test]
    fn data_role_is_sent_as_user() {
        let messages = vec![ChatMessage::new(ChatRole::Data, "{\"k\":1}")];
        let payload = client().build_request("", &messages, &CompletionOptions::default());

        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents[0]["role"], "user");
        assert!(payload.get("systemInstruction").is_none());
    }

    #[test]
    fn generation_config_only_when_set() {
        let messages = vec![ChatMessage::user("hi")];

        let bare = client().build_request("", &messages, &CompletionOptions::default());
        assert!(bare.get("generationConfig").is_none());

        let options = CompletionOptions::new().temperature(0.7).max_output_tokens(2048);
        let tuned = client().build_request("", &messages, &options);
        assert_eq!(tuned["generationConfig"]["maxOutputTokens"], 2048);
    }
}
