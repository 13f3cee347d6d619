use super::{ChatBackend, ChatReply, ProviderError};
use async_trait::async_trait;
use common::configuration::Settings;
use common::providers::ProviderId;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const OPENAI_MODEL: &str = "gpt-4o-mini";
const ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
const GEMINI_MODEL: &str = "gemini-1.5-flash";

const ANTHROPIC_VERSION: &str = "2023-06-01";

// Generation parameters are fixed per deployment, not request-configurable.
const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// One adapter for all three providers. The providers differ only in endpoint,
/// auth header and response shape, so those live in per-provider match arms
/// while the call path, error extraction and normalization are shared.
pub struct ProviderClient {
    client: reqwest::Client,
    settings: Settings,
    openai_base_url: String,
    anthropic_base_url: String,
    gemini_base_url: String,
}

impl ProviderClient {
    pub fn new(settings: Settings) -> Self {
        ProviderClient {
            client: reqwest::Client::new(),
            settings,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            anthropic_base_url: ANTHROPIC_BASE_URL.to_string(),
            gemini_base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Point one provider at a different base URL. Used by tests to target a
    /// local mock server.
    pub fn with_base_url(mut self, provider: ProviderId, base_url: impl Into<String>) -> Self {
        match provider {
            ProviderId::OpenAI => self.openai_base_url = base_url.into(),
            ProviderId::Anthropic => self.anthropic_base_url = base_url.into(),
            ProviderId::Gemini => self.gemini_base_url = base_url.into(),
        }
        self
    }

    fn build_request(&self, provider: ProviderId, key: &str, message: &str) -> reqwest::RequestBuilder {
        match provider {
            ProviderId::OpenAI => self
                .client
                .post(format!("{}/v1/chat/completions", self.openai_base_url))
                .bearer_auth(key)
                .json(&json!({
                    "model": OPENAI_MODEL,
                    "messages": [{"role": "user", "content": message}],
                    "temperature": TEMPERATURE,
                    "max_tokens": MAX_OUTPUT_TOKENS,
                })),
            ProviderId::Anthropic => self
                .client
                .post(format!("{}/v1/messages", self.anthropic_base_url))
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": ANTHROPIC_MODEL,
                    "max_tokens": MAX_OUTPUT_TOKENS,
                    "temperature": TEMPERATURE,
                    "messages": [{"role": "user", "content": message}],
                })),
            ProviderId::Gemini => self
                .client
                .post(format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.gemini_base_url, GEMINI_MODEL
                ))
                .header("x-goog-api-key", key)
                .json(&json!({
                    "contents": [{"parts": [{"text": message}]}],
                    "generationConfig": {
                        "temperature": TEMPERATURE,
                        "maxOutputTokens": MAX_OUTPUT_TOKENS,
                    },
                })),
        }
    }
}

#[async_trait]
impl ChatBackend for ProviderClient {
    async fn invoke(
        &self,
        provider: ProviderId,
        message: &str,
    ) -> Result<ChatReply, ProviderError> {
        let Some(key) = self.settings.api_key(provider) else {
            return Err(ProviderError::not_configured(provider));
        };

        debug!(provider = %provider, "sending chat completion request");
        let response = self
            .build_request(provider, key, message)
            .send()
            .await
            .map_err(|err| ProviderError::transport(provider, &err))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| ProviderError::transport(provider, &err))?;

        if !(200..300).contains(&status) {
            let message = upstream_error_message(&body)
                .unwrap_or_else(|| format!("{provider} returned status {status}"));
            return Err(ProviderError {
                provider,
                status: Some(status),
                message,
            });
        }

        parse_reply(provider, &body)
    }
}

/// Providers agree on `{"error": {"message": ...}}` for error bodies; anything
/// else falls through to a generic message.
fn upstream_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?;
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    total_token_count: u64,
}

fn malformed(provider: ProviderId, why: String) -> ProviderError {
    ProviderError {
        provider,
        status: None,
        message: format!("unexpected response shape: {why}"),
    }
}

fn parse_reply(provider: ProviderId, body: &[u8]) -> Result<ChatReply, ProviderError> {
    match provider {
        ProviderId::OpenAI => {
            let parsed: OpenAIResponse =
                serde_json::from_slice(body).map_err(|err| malformed(provider, err.to_string()))?;
            let message = parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default();
            let tokens = parsed.usage.map(|usage| usage.total_tokens);
            Ok(ChatReply::new(provider, message, tokens))
        }
        ProviderId::Anthropic => {
            let parsed: AnthropicResponse =
                serde_json::from_slice(body).map_err(|err| malformed(provider, err.to_string()))?;
            let message = parsed
                .content
                .into_iter()
                .find_map(|block| block.text)
                .unwrap_or_default();
            let tokens = parsed
                .usage
                .map(|usage| usage.input_tokens + usage.output_tokens);
            Ok(ChatReply::new(provider, message, tokens))
        }
        ProviderId::Gemini => {
            let parsed: GeminiResponse =
                serde_json::from_slice(body).map_err(|err| malformed(provider, err.to_string()))?;
            let message = parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|candidate| candidate.content)
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|part| part.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();
            let tokens = parsed.usage_metadata.map(|usage| usage.total_token_count);
            Ok(ChatReply::new(provider, message, tokens))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    fn client_for(server: &Server, provider: ProviderId, key: &str) -> ProviderClient {
        ProviderClient::new(Settings::for_tests(&[(provider, key)]))
            .with_base_url(provider, server.url())
    }

    #[tokio::test]
    async fn test_openai_success_with_usage() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}],
                    "usage":{"prompt_tokens":5,"completion_tokens":7,"total_tokens":12}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, ProviderId::OpenAI, "test-key");
        let reply = client.invoke(ProviderId::OpenAI, "hi").await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, ChatReply::new(ProviderId::OpenAI, "Hello!".into(), Some(12)));
    }

    #[tokio::test]
    async fn test_anthropic_success_sums_usage() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "ant-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"text","text":"Hi there"}],
                    "usage":{"input_tokens":10,"output_tokens":32}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, ProviderId::Anthropic, "ant-key");
        let reply = client.invoke(ProviderId::Anthropic, "hi").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            reply,
            ChatReply::new(ProviderId::Anthropic, "Hi there".into(), Some(42))
        );
    }

    #[tokio::test]
    async fn test_gemini_success_without_usage() {
        let mut server = Server::new_async().await;
        let path = format!("/v1beta/models/{GEMINI_MODEL}:generateContent");
        let mock = server
            .mock("POST", path.as_str())
            .match_header("x-goog-api-key", "gem-key")
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Howdy"}]}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, ProviderId::Gemini, "gem-key");
        let reply = client.invoke(ProviderId::Gemini, "hi").await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.model, "gemini");
        assert_eq!(reply.message, "Howdy");
        assert_eq!(reply.tokens_used, None);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits_before_any_call() {
        let client = ProviderClient::new(Settings::for_tests(&[(ProviderId::OpenAI, "key")]));
        let err = client.invoke(ProviderId::Gemini, "hi").await.unwrap_err();
        assert_eq!(err, ProviderError::not_configured(ProviderId::Gemini));
        assert!(!err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_429_extracts_upstream_error_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached for gpt-4o-mini","type":"tokens"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, ProviderId::OpenAI, "test-key");
        let err = client.invoke(ProviderId::OpenAI, "hi").await.unwrap_err();

        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "Rate limit reached for gpt-4o-mini");
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_non_json_error_body_falls_back_to_generic_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let client = client_for(&server, ProviderId::Anthropic, "ant-key");
        let err = client.invoke(ProviderId::Anthropic, "hi").await.unwrap_err();

        assert_eq!(err.status, Some(500));
        assert_eq!(err.message, "anthropic returned status 500");
        assert!(!err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_a_provider_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server, ProviderId::OpenAI, "test-key");
        let err = client.invoke(ProviderId::OpenAI, "hi").await.unwrap_err();

        assert_eq!(err.provider, ProviderId::OpenAI);
        assert!(err.message.starts_with("unexpected response shape"));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_upstream_error_message_extraction() {
        assert_eq!(
            upstream_error_message(br#"{"error":{"message":"boom"}}"#),
            Some("boom".to_string())
        );
        assert_eq!(upstream_error_message(br#"{"error":{"message":""}}"#), None);
        assert_eq!(upstream_error_message(br#"{"detail":"other"}"#), None);
        assert_eq!(upstream_error_message(b"plain text"), None);
    }
}
