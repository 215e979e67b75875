//! Shared request execution and error normalization for provider adapters.

use std::time::Duration;

use polychat_types::{PolychatError, ProviderId, Result};

/// Build an HTTP client whose requests give up after `timeout`.
pub(crate) fn build_client(provider: ProviderId, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            PolychatError::Config(format!("cannot build HTTP client for {provider}: {e}"))
        })
}

/// Send `request` and return its JSON body, folding every failure into
/// `PolychatError::ProviderCall` for `provider`.
pub(crate) async fn post_json(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value> {
    let resp = request
        .send()
        .await
        .map_err(|e| PolychatError::provider_call(provider, transport_message(e)))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| PolychatError::provider_call(provider, transport_message(e)))?;
    tracing::debug!(provider = %provider, status = status.as_u16(), bytes = body.len(), "Provider responded");

    if !status.is_success() {
        return Err(map_error(provider, status, &body));
    }

    serde_json::from_str(&body).map_err(|e| malformed(provider, format!("invalid JSON body: {e}")))
}

pub(crate) fn malformed(provider: ProviderId, what: impl std::fmt::Display) -> PolychatError {
    PolychatError::provider_call(provider, format!("malformed response: {what}"))
}

/// Describe a transport failure without its URL, which may carry an API key.
fn transport_message(err: reqwest::Error) -> String {
    let timed_out = err.is_timeout();
    let err = err.without_url();

    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    if timed_out {
        format!("request timed out: {message}")
    } else {
        message
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_error(provider: ProviderId, status: reqwest::StatusCode, body: &str) -> PolychatError {
    PolychatError::provider_call(
        provider,
        format!("HTTP {}: {}", status.as_u16(), error_payload(body)),
    )
}

/// The provider's structured error serialized back to text, or the raw body.
fn error_payload(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) => {
            let payload = v.get("error").unwrap_or(&v);
            serde_json::to_string(payload).unwrap_or_else(|_| body.to_string())
        }
        Err(_) => body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
