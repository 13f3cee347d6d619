use crate::configuration::Settings;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Provider identifier enum - simple enum for identifying the three chat backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAI,
    Anthropic,
    Gemini,
}

impl ProviderId {
    /// Fixed priority order used for auto-selection when a request names no model.
    pub const PRIORITY: [ProviderId; 3] =
        [ProviderId::OpenAI, ProviderId::Anthropic, ProviderId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
        }
    }

    /// The two other providers, in the order they are tried after this one.
    /// Kept as explicit data so every ordering is trivially testable.
    pub fn fallbacks(&self) -> [ProviderId; 2] {
        match self {
            ProviderId::OpenAI => [ProviderId::Anthropic, ProviderId::Gemini],
            ProviderId::Anthropic => [ProviderId::OpenAI, ProviderId::Gemini],
            ProviderId::Gemini => [ProviderId::OpenAI, ProviderId::Anthropic],
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("'{0}' is not a known provider")]
pub struct UnknownProviderError(pub String);

impl TryFrom<&str> for ProviderId {
    type Error = UnknownProviderError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "openai" => Ok(ProviderId::OpenAI),
            "anthropic" => Ok(ProviderId::Anthropic),
            "gemini" => Ok(ProviderId::Gemini),
            _ => Err(UnknownProviderError(value.to_string())),
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of providers whose credential is configured. Built once at startup,
/// read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    configured: Vec<ProviderId>,
}

impl ProviderRegistry {
    pub fn from_settings(settings: &Settings) -> Self {
        let configured = ProviderId::PRIORITY
            .into_iter()
            .filter(|id| settings.api_key(*id).is_some())
            .collect();
        ProviderRegistry { configured }
    }

    /// Test helper for building a registry from an explicit provider set.
    pub fn with_configured(configured: Vec<ProviderId>) -> Self {
        let configured = ProviderId::PRIORITY
            .into_iter()
            .filter(|id| configured.contains(id))
            .collect();
        ProviderRegistry { configured }
    }

    pub fn is_configured(&self, id: ProviderId) -> bool {
        self.configured.contains(&id)
    }

    pub fn available(&self) -> &[ProviderId] {
        &self.configured
    }

    /// First configured provider in priority order, if any.
    pub fn default_provider(&self) -> Option<ProviderId> {
        self.configured.first().copied()
    }

    /// The ordered list of providers to attempt for one request: the preferred
    /// provider first, then its fixed fallback sequence filtered to configured
    /// providers. A requested-but-unconfigured provider is treated as if no
    /// model had been requested at all.
    pub fn trial_order(&self, requested: Option<ProviderId>) -> Vec<ProviderId> {
        let preferred = requested
            .filter(|id| self.is_configured(*id))
            .or_else(|| self.default_provider());

        let Some(preferred) = preferred else {
            return Vec::new();
        };

        let mut order = vec![preferred];
        order.extend(
            preferred
                .fallbacks()
                .into_iter()
                .filter(|id| self.is_configured(*id)),
        );
        order
    }
}
