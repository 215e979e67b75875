//! Shared types and errors for the Polychat provider gateway.
//!
//! This crate provides the foundational types used across the other Polychat crates:
//! - `PolychatError` — unified error taxonomy
//! - `ProviderId` — the four supported chat providers
//! - `ProviderDescriptor` — static display metadata per provider

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unified error type for all Polychat subsystems.
#[derive(Debug, thiserror::Error)]
pub enum PolychatError {
    // === Provider Errors ===
    /// Any failure talking to a provider: transport, rejection, or malformed body.
    #[error("{provider} call failed: {message}")]
    ProviderCall {
        provider: ProviderId,
        message: String,
    },

    #[error("Invalid provider '{0}'")]
    InvalidProvider(String),

    #[error("Conversation history is empty")]
    EmptyHistory,

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PolychatError {
    /// Shorthand for building a normalized provider call failure.
    pub fn provider_call(provider: ProviderId, message: impl Into<String>) -> Self {
        PolychatError::ProviderCall {
            provider,
            message: message.into(),
        }
    }

    /// The provider an error is scoped to, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            PolychatError::ProviderCall { provider, .. } => Some(*provider),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, PolychatError>`.
pub type Result<T> = std::result::Result<T, PolychatError>;

// ---------------------------------------------------------------------------
// ProviderId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderId {
    Llama,
    Chatgpt,
    Claude,
    Gemini,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Llama,
        ProviderId::Chatgpt,
        ProviderId::Claude,
        ProviderId::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Llama => "LLAMA",
            ProviderId::Chatgpt => "CHATGPT",
            ProviderId::Claude => "CLAUDE",
            ProviderId::Gemini => "GEMINI",
        }
    }

    /// Prefix used for this provider's configuration keys.
    pub fn env_prefix(&self) -> &'static str {
        self.as_str()
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        &PROVIDERS[self.index()]
    }

    /// Position of this id within [`ProviderId::ALL`].
    pub fn index(&self) -> usize {
        match self {
            ProviderId::Llama => 0,
            ProviderId::Chatgpt => 1,
            ProviderId::Claude => 2,
            ProviderId::Gemini => 3,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = PolychatError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PolychatError::InvalidProvider(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ProviderDescriptor
// ---------------------------------------------------------------------------

/// Static display metadata for a provider, defined once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub display_name: &'static str,
    pub accent_color: &'static str,
}

/// Indexed by [`ProviderId::index`].
pub static PROVIDERS: [ProviderDescriptor; 4] = [
    ProviderDescriptor {
        id: ProviderId::Llama,
        display_name: "Llama (Groq)",
        accent_color: "#f55036",
    },
    ProviderDescriptor {
        id: ProviderId::Chatgpt,
        display_name: "ChatGPT",
        accent_color: "#10a37f",
    },
    ProviderDescriptor {
        id: ProviderId::Claude,
        display_name: "Claude",
        accent_color: "#d97757",
    },
    ProviderDescriptor {
        id: ProviderId::Gemini,
        display_name: "Gemini",
        accent_color: "#4285f4",
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
