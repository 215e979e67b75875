use async_trait::async_trait;
use polychat_types::{ProviderId, Result};

use crate::{ChatReply, Message};

// ---------------------------------------------------------------------------
// ProviderAdapter
// ---------------------------------------------------------------------------

/// One wire format's translation of a conversation into a reply.
///
/// Implementations are stateless between calls: no retries, no caching.
/// Every failure must come back as `PolychatError::ProviderCall`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn send_chat(&self, history: &[Message]) -> Result<ChatReply>;
    fn id(&self) -> ProviderId;
    fn model(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DynProvider
// ---------------------------------------------------------------------------

pub struct DynProvider(Box<dyn ProviderAdapter>);

impl DynProvider {
    pub fn new(provider: impl ProviderAdapter + 'static) -> Self {
        Self(Box::new(provider))
    }

    pub async fn send_chat(&self, history: &[Message]) -> Result<ChatReply> {
        self.0.send_chat(history).await
    }

    pub fn id(&self) -> ProviderId {
        self.0.id()
    }

    pub fn model(&self) -> &str {
        self.0.model()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenCount;
    use std::collections::HashMap;

    struct MockProvider;

    #[async_trait]
    impl ProviderAdapter for MockProvider {
        async fn send_chat(&self, history: &[Message]) -> Result<ChatReply> {
            Ok(ChatReply {
                text: format!("echo: {}", history.last().map(|m| m.content.as_str()).unwrap_or("")),
                tokens: TokenCount::Reported(7),
            })
        }

        fn id(&self) -> ProviderId {
            ProviderId::Chatgpt
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    #[tokio::test]
    async fn dyn_provider_send_chat() {
        let provider = DynProvider::new(MockProvider);
        let reply = provider.send_chat(&[Message::user("hi")]).await.unwrap();
        assert_eq!(reply.text, "echo: hi");
        assert_eq!(reply.tokens, TokenCount::Reported(7));
    }

    #[test]
    fn dyn_provider_metadata() {
        let provider = DynProvider::new(MockProvider);
        assert_eq!(provider.id(), ProviderId::Chatgpt);
        assert_eq!(provider.model(), "mock-model");
    }

    #[tokio::test]
    async fn dyn_provider_in_hashmap() {
        let mut providers: HashMap<ProviderId, DynProvider> = HashMap::new();
        providers.insert(ProviderId::Chatgpt, DynProvider::new(MockProvider));

        let provider = providers.get(&ProviderId::Chatgpt).unwrap();
        let reply = provider.send_chat(&[Message::user("again")]).await.unwrap();
        assert_eq!(reply.text, "echo: again");
    }
}
