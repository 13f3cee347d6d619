use crate::errors::{json_response, GatewayError};
use crate::state::AppState;
use bytes::Bytes;
use common::providers::ProviderId;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode};
use serde::Serialize;

#[derive(Serialize)]
struct ModelsResponse<'a> {
    available: &'a [ProviderId],
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<ProviderId>,
}

pub fn list_models(
    state: &AppState,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, GatewayError> {
    let models = ModelsResponse {
        available: state.registry.available(),
        default: state.registry.default_provider(),
    };
    let body = serde_json::to_value(&models).map_err(|err| GatewayError::Internal(err.to_string()))?;
    Ok(json_response(StatusCode::OK, body))
}
