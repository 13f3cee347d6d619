use common::consts::MAX_MESSAGE_CHARS;
use common::providers::ProviderId;
use serde_json::Value;
use thiserror::Error;

/// A chat request that passed validation. `message` is already trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub model: Option<ProviderId>,
}

/// Rules are checked in a fixed order and the first violation wins; the
/// variant's display string is what clients see in the 400 `details` field.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    InvalidBody,
    #[error("Message is required and must be a string")]
    MissingMessage,
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("Message must be at most 10000 characters")]
    MessageTooLong,
    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

pub fn validate_chat_request(body: &[u8]) -> Result<ChatRequest, ValidationError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidBody)?;
    let object = value.as_object().ok_or(ValidationError::InvalidBody)?;

    let message = object
        .get("message")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingMessage)?
        .trim();

    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ValidationError::MessageTooLong);
    }

    let model = match object.get("model") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(
            ProviderId::try_from(name.as_str())
                .map_err(|_| ValidationError::UnknownModel(name.clone()))?,
        ),
        Some(other) => return Err(ValidationError::UnknownModel(other.to_string())),
    };

    Ok(ChatRequest {
        message: message.to_string(),
        model,
    })
}
