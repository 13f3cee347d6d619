use crate::errors::{json_response, GatewayError};
use crate::state::AppState;
use crate::validation::validate_chat_request;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

pub async fn chat(
    state: Arc<AppState>,
    body: Bytes,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, GatewayError> {
    let request = validate_chat_request(&body)?;
    debug!(
        model = ?request.model,
        chars = request.message.chars().count(),
        "chat request accepted"
    );

    let reply = state.dispatcher.chat(&request).await?;
    let body = serde_json::to_value(&reply).map_err(|err| GatewayError::Internal(err.to_string()))?;
    Ok(json_response(StatusCode::OK, body))
}
