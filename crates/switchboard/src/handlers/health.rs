use crate::errors::json_response;
use crate::state::AppState;
use bytes::Bytes;
use common::providers::ProviderId;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode};
use serde_json::{json, Map, Value};

pub fn health(state: &AppState) -> Response<BoxBody<Bytes, hyper::Error>> {
    let models: Map<String, Value> = ProviderId::PRIORITY
        .iter()
        .map(|id| {
            (
                id.as_str().to_string(),
                Value::Bool(state.registry.is_configured(*id)),
            )
        })
        .collect();

    json_response(
        StatusCode::OK,
        json!({
            "status": "ok",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "models": models,
        }),
    )
}
