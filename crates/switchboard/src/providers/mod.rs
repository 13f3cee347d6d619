pub mod client;

use async_trait::async_trait;
use common::providers::ProviderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized chat completion, whichever provider produced it. `model` is the
/// fixed identifier of that provider, not the upstream model name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl ChatReply {
    pub fn new(provider: ProviderId, message: String, tokens_used: Option<u64>) -> Self {
        ChatReply {
            message,
            model: provider.as_str().to_string(),
            tokens_used,
        }
    }
}

/// A single failed provider attempt. `status` is the upstream HTTP status when
/// one was received; transport failures carry none.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{provider}: {message}")]
pub struct ProviderError {
    pub provider: ProviderId,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn not_configured(provider: ProviderId) -> Self {
        ProviderError {
            provider,
            status: None,
            message: "provider is not configured".to_string(),
        }
    }

    pub fn transport(provider: ProviderId, err: &reqwest::Error) -> Self {
        ProviderError {
            provider,
            status: None,
            message: format!("request failed: {err}"),
        }
    }

    /// Rate-limited failures are the only ones the dispatcher falls back from.
    /// Classified by status 429 or by the upstream error text mentioning
    /// "rate limit" verbatim.
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429) || self.message.contains("rate limit")
    }
}

/// Seam between the dispatcher and the outbound HTTP layer, so dispatch logic
/// is testable with a scripted backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn invoke(&self, provider: ProviderId, message: &str)
        -> Result<ChatReply, ProviderError>;
}
