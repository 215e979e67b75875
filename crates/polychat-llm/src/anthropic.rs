use async_trait::async_trait;
use polychat_types::{ProviderId, Result};
use serde_json::json;
use std::time::Duration;

use crate::http::{build_client, malformed, post_json};
use crate::{ChatReply, Message, ProviderAdapter, TokenCount};

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.3;
const API_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// AnthropicAdapter
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
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
}

// ---------------------------------------------------------------------------
// Request translation (history → Anthropic JSON)
// ---------------------------------------------------------------------------

fn build_request_body(history: &[Message]) -> serde_json::Value {
    json!({
        "model": DEFAULT_MODEL,
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
        "messages": history,
    })
}

// ---------------------------------------------------------------------------
// Response translation (Anthropic JSON → ChatReply)
// ---------------------------------------------------------------------------

fn parse_response(body: &serde_json::Value) -> Result<ChatReply> {
    let provider = ProviderId::Claude;

    let text = body["content"][0]["text"]
        .as_str()
        .ok_or_else(|| malformed(provider, "missing content[0].text"))?;

    let usage = &body["usage"];
    let input_tokens = usage["input_tokens"]
        .as_u64()
        .ok_or_else(|| malformed(provider, "missing usage.input_tokens"))?;
    let output_tokens = usage["output_tokens"]
        .as_u64()
        .ok_or_else(|| malformed(provider, "missing usage.output_tokens"))?;

    Ok(ChatReply {
        text: text.to_string(),
        tokens: TokenCount::Reported(input_tokens + output_tokens),
    })
}

// ---------------------------------------------------------------------------
// ProviderAdapter implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    async fn send_chat(&self, history: &[Message]) -> Result<ChatReply> {
        let body = build_request_body(history);

        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let json = post_json(ProviderId::Claude, request).await?;
        parse_response(&json)
    }

    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn model(&self) -> &str {
        DEFAULT_MODEL
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
