use async_trait::async_trait;
use polychat_types::{ProviderId, Result};
use serde_json::json;
use std::time::Duration;

use crate::http::{build_client, malformed, post_json};
use crate::{estimate_tokens, ChatReply, Message, ProviderAdapter, Role, TokenCount};

const DEFAULT_MODEL: &str = "gemini-1.5-flash";

// ---------------------------------------------------------------------------
// GeminiAdapter
// ---------------------------------------------------------------------------

/// Gemini `generateContent` client.
///
/// The API key travels as a query parameter, and since usage is not read
/// back, token counts are estimated from the submitted history.
#[derive(Debug)]
pub struct GeminiAdapter {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(self.id(), timeout)?;
        Ok(self)
    }

    fn build_request_body(&self, history: &[Message]) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = history.iter().map(convert_message).collect();
        json!({ "contents": contents })
    }

    fn parse_response(&self, json: &serde_json::Value, history: &[Message]) -> Result<ChatReply> {
        let text = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                malformed(ProviderId::Gemini, "missing candidates[0].content.parts[0].text")
            })?;

        Ok(ChatReply {
            text: text.to_string(),
            tokens: TokenCount::Estimated(estimate_tokens(history)),
        })
    }
}

// ---------------------------------------------------------------------------
// Message conversion helpers
// ---------------------------------------------------------------------------

fn convert_message(msg: &Message) -> serde_json::Value {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "model",
    };

    json!({
        "role": role,
        "parts": [{ "text": msg.content }]
    })
}

// ---------------------------------------------------------------------------
// ProviderAdapter implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    async fn send_chat(&self, history: &[Message]) -> Result<ChatReply> {
        let body = self.build_request_body(history);

        let request = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, DEFAULT_MODEL))
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&body);

        let json = post_json(ProviderId::Gemini, request).await?;
        self.parse_response(&json, history)
    }

    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn model(&self) -> &str {
        DEFAULT_MODEL
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
