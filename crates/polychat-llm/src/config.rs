use std::collections::BTreeMap;
use std::time::Duration;

use polychat_types::{PolychatError, ProviderId, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const TIMEOUT_KEY: &str = "POLYCHAT_REQUEST_TIMEOUT_SECS";

// ---------------------------------------------------------------------------
// ProviderSettings
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub price_per_million: f64,
    /// Overrides the provider's fixed endpoint host, mainly for proxies and tests.
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"<redacted>")
            .field("price_per_million", &self.price_per_million)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

/// Credentials and pricing for every provider, validated up front.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    providers: BTreeMap<ProviderId, ProviderSettings>,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(settings: impl IntoIterator<Item = (ProviderId, ProviderSettings)>) -> Result<Self> {
        let providers: BTreeMap<_, _> = settings.into_iter().collect();
        let missing: Vec<&str> = ProviderId::ALL
            .iter()
            .filter(|id| !providers.contains_key(id))
            .map(|id| id.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(PolychatError::Config(format!(
                "no settings for {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            providers,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Read every provider's settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, collecting every problem before failing.
    ///
    /// Keys per provider: `<ID>_API_KEY`, `<ID>_PRICE_PER_MILLION`, and the
    /// optional `<ID>_BASE_URL`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut problems: Vec<String> = Vec::new();
        let mut providers = BTreeMap::new();

        for id in ProviderId::ALL {
            let prefix = id.env_prefix();
            let key_name = format!("{prefix}_API_KEY");
            let price_name = format!("{prefix}_PRICE_PER_MILLION");

            let api_key = non_empty(lookup(&key_name));
            if api_key.is_none() {
                problems.push(format!("{key_name} is not set"));
            }

            let price = match non_empty(lookup(&price_name)) {
                None => {
                    problems.push(format!("{price_name} is not set"));
                    None
                }
                Some(raw) => match parse_price(&raw) {
                    Ok(p) => Some(p),
                    Err(reason) => {
                        problems.push(format!("{price_name} {reason}"));
                        None
                    }
                },
            };

            if let (Some(api_key), Some(price_per_million)) = (api_key, price) {
                providers.insert(
                    id,
                    ProviderSettings {
                        api_key,
                        price_per_million,
                        base_url: non_empty(lookup(&format!("{prefix}_BASE_URL"))),
                    },
                );
            }
        }

        let request_timeout = match non_empty(lookup(TIMEOUT_KEY)) {
            None => DEFAULT_REQUEST_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    problems.push(format!("{TIMEOUT_KEY} must be a positive integer, got '{raw}'"));
                    DEFAULT_REQUEST_TIMEOUT
                }
            },
        };

        if !problems.is_empty() {
            return Err(PolychatError::Config(problems.join("; ")));
        }

        tracing::debug!(providers = providers.len(), ?request_timeout, "Loaded gateway config");
        Ok(Self {
            providers,
            request_timeout,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn settings(&self, id: ProviderId) -> &ProviderSettings {
        // Construction guarantees an entry for every id.
        &self.providers[&id]
    }

    pub fn price_per_million(&self, id: ProviderId) -> f64 {
        self.settings(id).price_per_million
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_price(raw: &str) -> std::result::Result<f64, String> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("is not a number: '{raw}'"))?;
    if !price.is_finite() {
        return Err(format!("must be finite, got '{raw}'"));
    }
    if price < 0.0 {
        return Err(format!("must not be negative, got '{raw}'"));
    }
    Ok(price)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<String, String> {
        let mut env = HashMap::new();
        for (id, price) in [("LLAMA", "0.59"), ("CHATGPT", "5"), ("CLAUDE", "3.00"), ("GEMINI", "0.35")] {
            env.insert(format!("{id}_API_KEY"), format!("key-{id}"));
            env.insert(format!("{id}_PRICE_PER_MILLION"), price.to_string());
        }
        env
    }

    fn load(env: &HashMap<String, String>) -> Result<GatewayConfig> {
        GatewayConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn loads_all_four_providers() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.price_per_million(ProviderId::Claude), 3.0);
        assert_eq!(config.price_per_million(ProviderId::Llama), 0.59);
        assert_eq!(config.settings(ProviderId::Gemini).api_key, "key-GEMINI");
        assert!(config.settings(ProviderId::Chatgpt).base_url.is_none());
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn reads_optional_base_url_and_timeout() {
        let mut env = full_env();
        env.insert("CLAUDE_BASE_URL".into(), "http://localhost:9000".into());
        env.insert(TIMEOUT_KEY.into(), "30".into());
        let config = load(&env).unwrap();
        assert_eq!(
            config.settings(ProviderId::Claude).base_url.as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_entries_are_all_reported() {
        let mut env = full_env();
        env.remove("GEMINI_API_KEY");
        env.remove("LLAMA_PRICE_PER_MILLION");
        let err = load(&env).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, PolychatError::Config(_)));
        assert!(msg.contains("GEMINI_API_KEY is not set"), "{msg}");
        assert!(msg.contains("LLAMA_PRICE_PER_MILLION is not set"), "{msg}");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut env = full_env();
        env.insert("CHATGPT_API_KEY".into(), "   ".into());
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("CHATGPT_API_KEY is not set"));
    }

    #[test]
    fn bad_prices_fail_fast() {
        for bad in ["abc", "NaN", "inf", "-1"] {
            let mut env = full_env();
            env.insert("CLAUDE_PRICE_PER_MILLION".into(), bad.into());
            let err = load(&env).unwrap_err();
            assert!(
                err.to_string().contains("CLAUDE_PRICE_PER_MILLION"),
                "price '{bad}' should be rejected: {err}"
            );
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut env = full_env();
        env.insert(TIMEOUT_KEY.into(), "0".into());
        assert!(load(&env).is_err());
    }

    #[test]
    fn new_requires_every_provider() {
        let settings = ProviderSettings {
            api_key: "k".into(),
            price_per_million: 1.0,
            base_url: None,
        };
        let err = GatewayConfig::new([(ProviderId::Claude, settings)]).unwrap_err();
        assert!(err.to_string().contains("LLAMA, CHATGPT, GEMINI"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = load(&full_env()).unwrap();
        let rendered = format!("{:?}", config.settings(ProviderId::Claude));
        assert!(!rendered.contains("key-CLAUDE"));
        assert!(rendered.contains("<redacted>"));
    }
}
