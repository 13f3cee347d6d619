use crate::consts::{DEFAULT_ALLOWED_ORIGINS, DEFAULT_JOBS_API_URL, DEFAULT_PORT};
use crate::providers::ProviderId;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Internal error detail (provider messages, transport errors) is only
    /// surfaced to clients in development.
    pub fn expose_error_detail(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        match value {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),
    #[error(
        "no provider API key configured; set at least one of \
         OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY"
    )]
    NoProvidersConfigured,
}

/// Process-wide configuration, read from the environment once at startup and
/// passed explicitly into request handling. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    pub jobs_api_url: String,
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
    gemini_api_key: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => parse_port(&raw)?,
            Err(_) => DEFAULT_PORT,
        };

        let environment = env::var("APP_ENV")
            .map(|v| Environment::from(v.as_str()))
            .unwrap_or(Environment::Production);

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        let jobs_api_url =
            env::var("JOBS_API_URL").unwrap_or_else(|_| DEFAULT_JOBS_API_URL.to_string());

        let settings = Settings {
            port,
            environment,
            allowed_origins,
            jobs_api_url,
            openai_api_key: non_empty(env::var("OPENAI_API_KEY").ok()),
            anthropic_api_key: non_empty(env::var("ANTHROPIC_API_KEY").ok()),
            gemini_api_key: non_empty(env::var("GEMINI_API_KEY").ok()),
        };

        if ProviderId::PRIORITY
            .iter()
            .all(|id| settings.api_key(*id).is_none())
        {
            return Err(ConfigError::NoProvidersConfigured);
        }

        Ok(settings)
    }

    pub fn api_key(&self, id: ProviderId) -> Option<&str> {
        match id {
            ProviderId::OpenAI => self.openai_api_key.as_deref(),
            ProviderId::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderId::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    /// Test helper: build settings without touching the process environment.
    pub fn for_tests(keys: &[(ProviderId, &str)]) -> Self {
        let key_for = |id: ProviderId| {
            keys.iter()
                .find(|(k, _)| *k == id)
                .map(|(_, v)| v.to_string())
        };
        Settings {
            port: DEFAULT_PORT,
            environment: Environment::Development,
            allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
            jobs_api_url: DEFAULT_JOBS_API_URL.to_string(),
            openai_api_key: key_for(ProviderId::OpenAI),
            anthropic_api_key: key_for(ProviderId::Anthropic),
            gemini_api_key: key_for(ProviderId::Gemini),
        }
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
