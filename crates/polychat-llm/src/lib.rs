//! Multi-provider chat gateway with per-provider cost accounting.
//!
//! Provides the `ProviderAdapter` trait, `DynProvider` wrapper, one adapter per
//! wire format (OpenAI-compatible, Anthropic, Gemini), the `Gateway` dispatch
//! entrypoint, and the caller-owned `Conversation` with its `CostLedger`.

#[cfg(feature = "providers")]
mod anthropic;
#[cfg(feature = "providers")]
mod client;
mod config;
#[cfg(feature = "providers")]
mod gemini;
#[cfg(feature = "providers")]
mod http;
mod ledger;
#[cfg(feature = "providers")]
mod openai;
mod pricing;
#[cfg(feature = "providers")]
mod provider;
#[cfg(feature = "providers")]
mod session;
mod types;

#[cfg(feature = "providers")]
pub use anthropic::AnthropicAdapter;
#[cfg(feature = "providers")]
pub use client::*;
pub use config::*;
#[cfg(feature = "providers")]
pub use gemini::GeminiAdapter;
pub use ledger::CostLedger;
#[cfg(feature = "providers")]
pub use openai::OpenAiCompatAdapter;
pub use pricing::*;
#[cfg(feature = "providers")]
pub use provider::*;
#[cfg(feature = "providers")]
pub use session::*;
pub use types::*;

pub use polychat_types::{PolychatError, ProviderDescriptor, ProviderId, Result, PROVIDERS};
