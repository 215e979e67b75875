use polychat_types::{ProviderId, Result};
use serde::Serialize;

use crate::{CallResult, CostLedger, Gateway, Message};

// ---------------------------------------------------------------------------
// TranscriptEntry
// ---------------------------------------------------------------------------

/// What the presentation layer renders, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Message {
        message: Message,
        /// Provider that produced an assistant turn.
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderId>,
    },
    /// Shown in place of a reply. Never replayed to a provider.
    Error { provider: ProviderId, message: String },
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Caller-owned chat session: history, transcript, and cost ledger.
///
/// `submit` takes `&mut self`, so at most one dispatch per conversation is
/// in flight and history updates cannot interleave.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    selected: ProviderId,
    history: Vec<Message>,
    transcript: Vec<TranscriptEntry>,
    ledger: CostLedger,
}

impl Conversation {
    pub fn new(selected: ProviderId) -> Self {
        Self {
            selected,
            history: Vec::new(),
            transcript: Vec::new(),
            ledger: CostLedger::new(),
        }
    }

    pub fn select(&mut self, provider: ProviderId) {
        tracing::debug!(from = %self.selected, to = %provider, "Switching provider");
        self.selected = provider;
    }

    pub fn selected(&self) -> ProviderId {
        self.selected
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    /// Append a user turn, send the whole history to the selected provider,
    /// and record the reply and its cost.
    ///
    /// On failure the error is added to the transcript and the ledger is left
    /// untouched. The user turn stays in history.
    pub async fn submit(&mut self, gateway: &Gateway, text: impl Into<String>) -> Result<CallResult> {
        let provider = self.selected;
        let user = Message::user(text);
        self.history.push(user.clone());
        self.transcript.push(TranscriptEntry::Message {
            message: user,
            provider: None,
        });

        match gateway.dispatch(provider, &self.history).await {
            Ok(result) => {
                let reply = Message::assistant(result.reply_text.clone());
                self.history.push(reply.clone());
                self.transcript.push(TranscriptEntry::Message {
                    message: reply,
                    provider: Some(result.provider),
                });
                self.ledger.record(result.provider, result.cost);
                Ok(result)
            }
            Err(e) => {
                self.transcript.push(TranscriptEntry::Error {
                    provider,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
