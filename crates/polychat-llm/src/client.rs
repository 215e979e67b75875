use std::collections::HashMap;

use polychat_types::{PolychatError, ProviderDescriptor, ProviderId, Result};

use crate::{
    compute_cost, AnthropicAdapter, CallResult, DynProvider, GatewayConfig, GeminiAdapter,
    Message, OpenAiCompatAdapter, ProviderAdapter,
};

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

pub trait Middleware: Send + Sync {
    fn before(&self, _provider: ProviderId, _history: &[Message]) {}
    fn after(&self, _result: &CallResult) {}
    fn on_error(&self, _provider: ProviderId, _error: &PolychatError) {}
}

// ---------------------------------------------------------------------------
// Built-in middleware: LoggingMiddleware
// ---------------------------------------------------------------------------

pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before(&self, provider: ProviderId, history: &[Message]) {
        tracing::info!(provider = %provider, messages = history.len(), "Chat request");
    }

    fn after(&self, result: &CallResult) {
        tracing::info!(
            provider = %result.provider,
            tokens = result.tokens.as_f64(),
            estimated = result.tokens.is_estimate(),
            cost = result.cost,
            "Chat response"
        );
    }

    fn on_error(&self, provider: ProviderId, error: &PolychatError) {
        tracing::warn!(provider = %provider, error = %error, "Chat request failed");
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

struct Registered {
    adapter: DynProvider,
    price_per_million: f64,
}

/// Routes a conversation to the selected provider and prices the reply.
pub struct Gateway {
    providers: HashMap<ProviderId, Registered>,
    middleware: Vec<Box<dyn Middleware>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            middleware: Vec::new(),
        }
    }

    /// Register `adapter` under its own id, replacing any previous one.
    pub fn register(&mut self, adapter: impl ProviderAdapter + 'static, price_per_million: f64) {
        let id = adapter.id();
        self.providers.insert(
            id,
            Registered {
                adapter: DynProvider::new(adapter),
                price_per_million,
            },
        );
    }

    pub fn with_middleware(mut self, m: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(m));
        self
    }

    /// Build a gateway with all four providers wired from `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let mut gateway = Self::new().with_middleware(LoggingMiddleware);
        let timeout = config.request_timeout;

        let llama = config.settings(ProviderId::Llama);
        let mut adapter = OpenAiCompatAdapter::groq(llama.api_key.clone()).with_timeout(timeout)?;
        if let Some(url) = &llama.base_url {
            adapter = adapter.with_base_url(url.clone());
        }
        gateway.register(adapter, llama.price_per_million);

        let chatgpt = config.settings(ProviderId::Chatgpt);
        let mut adapter = OpenAiCompatAdapter::openai(chatgpt.api_key.clone()).with_timeout(timeout)?;
        if let Some(url) = &chatgpt.base_url {
            adapter = adapter.with_base_url(url.clone());
        }
        gateway.register(adapter, chatgpt.price_per_million);

        let claude = config.settings(ProviderId::Claude);
        let mut adapter = AnthropicAdapter::new(claude.api_key.clone()).with_timeout(timeout)?;
        if let Some(url) = &claude.base_url {
            adapter = adapter.with_base_url(url.clone());
        }
        gateway.register(adapter, claude.price_per_million);

        let gemini = config.settings(ProviderId::Gemini);
        let mut adapter = GeminiAdapter::new(gemini.api_key.clone()).with_timeout(timeout)?;
        if let Some(url) = &gemini.base_url {
            adapter = adapter.with_base_url(url.clone());
        }
        gateway.register(adapter, gemini.price_per_million);

        Ok(gateway)
    }

    /// Descriptors of registered providers, in `ProviderId::ALL` order.
    pub fn descriptors(&self) -> Vec<&'static ProviderDescriptor> {
        ProviderId::ALL
            .iter()
            .filter(|id| self.providers.contains_key(id))
            .map(|id| id.descriptor())
            .collect()
    }

    pub fn model(&self, provider: ProviderId) -> Option<&str> {
        self.providers.get(&provider).map(|r| r.adapter.model())
    }

    pub fn price_per_million(&self, provider: ProviderId) -> Option<f64> {
        self.providers.get(&provider).map(|r| r.price_per_million)
    }

    /// Send `history` to `provider` and return the reply with its cost.
    pub async fn dispatch(&self, provider: ProviderId, history: &[Message]) -> Result<CallResult> {
        let registered = self.resolve(provider)?;
        if history.is_empty() {
            return Err(PolychatError::EmptyHistory);
        }

        for m in &self.middleware {
            m.before(provider, history);
        }

        let reply = match registered.adapter.send_chat(history).await {
            Ok(reply) => reply,
            Err(e) => {
                for m in &self.middleware {
                    m.on_error(provider, &e);
                }
                return Err(e);
            }
        };

        let result = CallResult {
            provider,
            cost: compute_cost(reply.tokens.as_f64(), registered.price_per_million),
            reply_text: reply.text,
            tokens: reply.tokens,
        };

        for m in &self.middleware {
            m.after(&result);
        }

        Ok(result)
    }

    /// Like [`dispatch`](Self::dispatch), for a provider named by string.
    pub async fn dispatch_named(&self, provider: &str, history: &[Message]) -> Result<CallResult> {
        let id: ProviderId = provider.parse()?;
        self.dispatch(id, history).await
    }

    fn resolve(&self, provider: ProviderId) -> Result<&Registered> {
        self.providers
            .get(&provider)
            .ok_or_else(|| PolychatError::InvalidProvider(provider.to_string()))
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatReply, TokenCount};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockProvider {
        id: ProviderId,
        tokens: TokenCount,
        fail: bool,
        call_count: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn new(id: ProviderId, tokens: TokenCount) -> Self {
            Self {
                id,
                tokens,
                fail: false,
                call_count: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockProvider {
        async fn send_chat(&self, _history: &[Message]) -> Result<ChatReply> {
            self.call_count.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(PolychatError::provider_call(self.id, "HTTP 500: boom"));
            }
            Ok(ChatReply {
                text: "Hello from mock".into(),
                tokens: self.tokens,
            })
        }

        fn id(&self) -> ProviderId {
            self.id
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    #[tokio::test]
    async fn dispatch_prices_reported_tokens() {
        let mut gateway = Gateway::new();
        gateway.register(MockProvider::new(ProviderId::Claude, TokenCount::Reported(15)), 3.0);

        let result = gateway
            .dispatch(ProviderId::Claude, &[Message::user("2+2?")])
            .await
            .unwrap();
        assert_eq!(result.provider, ProviderId::Claude);
        assert_eq!(result.reply_text, "Hello from mock");
        assert!((result.cost - 0.000045).abs() < 1e-12);
    }

    #[tokio::test]
    async fn dispatch_prices_estimated_tokens() {
        let mut gateway = Gateway::new();
        gateway.register(MockProvider::new(ProviderId::Gemini, TokenCount::Estimated(2.6)), 1.0);

        let result = gateway
            .dispatch(ProviderId::Gemini, &[Message::user("hi")])
            .await
            .unwrap();
        assert!((result.cost - 0.0000026).abs() < 1e-15);
        assert!(result.tokens.is_estimate());
    }

    #[tokio::test]
    async fn unregistered_provider_fails_before_calling_anything() {
        let mock = MockProvider::new(ProviderId::Claude, TokenCount::Reported(1));
        let calls = mock.call_count.clone();
        let mut gateway = Gateway::new();
        gateway.register(mock, 3.0);

        let err = gateway
            .dispatch(ProviderId::Llama, &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, PolychatError::InvalidProvider(ref id) if id == "LLAMA"));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn unknown_provider_name_is_rejected() {
        let mock = MockProvider::new(ProviderId::Claude, TokenCount::Reported(1));
        let calls = mock.call_count.clone();
        let mut gateway = Gateway::new();
        gateway.register(mock, 3.0);

        let err = gateway
            .dispatch_named("mistral", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, PolychatError::InvalidProvider(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        let ok = gateway.dispatch_named("claude", &[Message::user("hi")]).await;
        assert!(ok.is_ok());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn empty_history_is_rejected() {
        let mock = MockProvider::new(ProviderId::Chatgpt, TokenCount::Reported(1));
        let calls = mock.call_count.clone();
        let mut gateway = Gateway::new();
        gateway.register(mock, 3.0);

        let err = gateway.dispatch(ProviderId::Chatgpt, &[]).await.unwrap_err();
        assert!(matches!(err, PolychatError::EmptyHistory));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn middleware_hooks_called() {
        let before_count = Arc::new(AtomicUsize::new(0));
        let after_count = Arc::new(AtomicUsize::new(0));
        let error_count = Arc::new(AtomicUsize::new(0));

        struct CountingMiddleware {
            before_count: Arc<AtomicUsize>,
            after_count: Arc<AtomicUsize>,
            error_count: Arc<AtomicUsize>,
        }

        impl Middleware for CountingMiddleware {
            fn before(&self, _provider: ProviderId, _history: &[Message]) {
                self.before_count.fetch_add(1, Ordering::Relaxed);
            }
            fn after(&self, _result: &CallResult) {
                self.after_count.fetch_add(1, Ordering::Relaxed);
            }
            fn on_error(&self, _provider: ProviderId, _error: &PolychatError) {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut gateway = Gateway::new().with_middleware(CountingMiddleware {
            before_count: before_count.clone(),
            after_count: after_count.clone(),
            error_count: error_count.clone(),
        });
        gateway.register(MockProvider::new(ProviderId::Llama, TokenCount::Reported(3)), 1.0);
        let mut failing = MockProvider::new(ProviderId::Chatgpt, TokenCount::Reported(3));
        failing.fail = true;
        gateway.register(failing, 1.0);

        let history = [Message::user("hello")];
        gateway.dispatch(ProviderId::Llama, &history).await.unwrap();
        assert!(gateway.dispatch(ProviderId::Chatgpt, &history).await.is_err());

        assert_eq!(before_count.load(Ordering::Relaxed), 2);
        assert_eq!(after_count.load(Ordering::Relaxed), 1);
        assert_eq!(error_count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn from_config_registers_every_provider() {
        let config = GatewayConfig::from_lookup(|key| {
            if key.ends_with("_API_KEY") {
                Some("k".into())
            } else if key.ends_with("_PRICE_PER_MILLION") {
                Some("2.5".into())
            } else {
                None
            }
        })
        .unwrap();

        let gateway = Gateway::from_config(&config).unwrap();
        let ids: Vec<ProviderId> = gateway.descriptors().iter().map(|d| d.id).collect();
        assert_eq!(ids, ProviderId::ALL);
        assert_eq!(gateway.price_per_million(ProviderId::Gemini), Some(2.5));
        assert_eq!(gateway.model(ProviderId::Chatgpt), Some("gpt-4o"));
    }

    #[test]
    fn descriptors_only_list_registered() {
        let mut gateway = Gateway::new();
        gateway.register(MockProvider::new(ProviderId::Gemini, TokenCount::Reported(0)), 0.0);
        let ids: Vec<ProviderId> = gateway.descriptors().iter().map(|d| d.id).collect();
        assert_eq!(ids, [ProviderId::Gemini]);
        assert_eq!(gateway.price_per_million(ProviderId::Claude), None);
    }
}
