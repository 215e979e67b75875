use polychat_types::ProviderId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One turn of a conversation. Histories are replayed verbatim on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TokenCount
// ---------------------------------------------------------------------------

/// Tokens consumed by one call, either reported by the provider or estimated locally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TokenCount {
    Reported(u64),
    Estimated(f64),
}

impl TokenCount {
    pub fn as_f64(&self) -> f64 {
        match self {
            TokenCount::Reported(n) => *n as f64,
            TokenCount::Estimated(n) => *n,
        }
    }

    pub fn is_estimate(&self) -> bool {
        matches!(self, TokenCount::Estimated(_))
    }
}

// ---------------------------------------------------------------------------
// ChatReply / CallResult
// ---------------------------------------------------------------------------

/// What a provider adapter hands back before pricing is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub tokens: TokenCount,
}

/// Normalized output of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub provider: ProviderId,
    pub reply_text: String,
    pub cost: f64,
    pub tokens: TokenCount,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");

        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Hi there");
    }

    #[test]
    fn message_serializes_in_chat_shape() {
        let json = serde_json::to_value(Message::assistant("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hello"}));
    }

    #[test]
    fn token_count_as_f64() {
        assert_eq!(TokenCount::Reported(15).as_f64(), 15.0);
        assert_eq!(TokenCount::Estimated(2.6).as_f64(), 2.6);
        assert!(TokenCount::Estimated(0.0).is_estimate());
        assert!(!TokenCount::Reported(0).is_estimate());
    }

    #[test]
    fn token_count_serializes_with_kind_tag() {
        let json = serde_json::to_value(TokenCount::Reported(42)).unwrap();
        assert_eq!(json["kind"], "reported");
        assert_eq!(json["value"], 42);
    }
}
