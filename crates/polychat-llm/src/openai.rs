use async_trait::async_trait;
use polychat_types::{ProviderId, Result};
use serde_json::json;
use std::time::Duration;

use crate::http::{build_client, malformed, post_json};
use crate::{ChatReply, Message, ProviderAdapter, TokenCount};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
const GROQ_MODEL: &str = "llama-3.3-70b-versatile";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OPENAI_MODEL: &str = "gpt-4o";

// ---------------------------------------------------------------------------
// OpenAiCompatAdapter
// ---------------------------------------------------------------------------

/// Chat-completions client shared by OpenAI itself and Groq's compatible endpoint.
#[derive(Debug)]
pub struct OpenAiCompatAdapter {
    id: ProviderId,
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl OpenAiCompatAdapter {
    /// Llama served by Groq.
    pub fn groq(api_key: String) -> Self {
        Self {
            id: ProviderId::Llama,
            api_key,
            client: reqwest::Client::new(),
            base_url: GROQ_BASE_URL.to_string(),
            model: GROQ_MODEL.to_string(),
            temperature: Some(0.5),
            max_tokens: Some(4096),
        }
    }

    /// ChatGPT with the API's default sampling parameters.
    pub fn openai(api_key: String) -> Self {
        Self {
            id: ProviderId::Chatgpt,
            api_key,
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: OPENAI_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
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
        let mut body = json!({
            "model": self.model,
            "messages": history,
        });

        if let Some(temp) = self.temperature {
            body["temperature"] = json!(temp);
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }

    fn parse_response(&self, body: &serde_json::Value) -> Result<ChatReply> {
        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| malformed(self.id, "missing choices[0].message.content"))?;

        let total_tokens = body["usage"]["total_tokens"]
            .as_u64()
            .ok_or_else(|| malformed(self.id, "missing usage.total_tokens"))?;

        Ok(ChatReply {
            text: text.to_string(),
            tokens: TokenCount::Reported(total_tokens),
        })
    }
}

// ---------------------------------------------------------------------------
// ProviderAdapter implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ProviderAdapter for OpenAiCompatAdapter {
    async fn send_chat(&self, history: &[Message]) -> Result<ChatReply> {
        let body = self.build_request_body(history);

        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let json = post_json(self.id, request).await?;
        self.parse_response(&json)
    }

    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
