use crate::providers::{ChatBackend, ChatReply, ProviderError};
use crate::validation::ChatRequest;
use common::providers::ProviderRegistry;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no chat providers are configured")]
    NoProviders,
    #[error("all attempted providers failed, last error: {last}")]
    AllFailed { last: ProviderError },
}

impl DispatchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DispatchError::AllFailed { last } if last.is_rate_limited())
    }
}

/// Tries providers in the registry's trial order, strictly sequentially.
/// A rate-limited failure advances to the next provider; any other failure
/// aborts the whole request. Trusting one provider's hard error to apply
/// broadly is deliberate policy, traded for fast and predictable failure.
pub struct Dispatcher {
    registry: ProviderRegistry,
    backend: Arc<dyn ChatBackend>,
}

impl Dispatcher {
    pub fn new(registry: ProviderRegistry, backend: Arc<dyn ChatBackend>) -> Self {
        Dispatcher { registry, backend }
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, DispatchError> {
        let order = self.registry.trial_order(request.model);
        let mut last_error: Option<ProviderError> = None;

        for provider in order {
            match self.backend.invoke(provider, &request.message).await {
                Ok(reply) => {
                    info!(provider = %provider, tokens = ?reply.tokens_used, "chat completion succeeded");
                    return Ok(reply);
                }
                Err(err) if err.is_rate_limited() => {
                    warn!(provider = %provider, error = %err, "provider rate limited, trying next");
                    last_error = Some(err);
                }
                Err(err) => {
                    warn!(provider = %provider, error = %err, "provider failed, aborting");
                    return Err(DispatchError::AllFailed { last: err });
                }
            }
        }

        match last_error {
            Some(last) => Err(DispatchError::AllFailed { last }),
            None => Err(DispatchError::NoProviders),
        }
    }
}
