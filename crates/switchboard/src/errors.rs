use crate::dispatch::DispatchError;
use crate::validation::ValidationError;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{Error as HyperError, Response, StatusCode};
use serde_json::json;
use thiserror::Error;

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, HyperError> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response(
    status: StatusCode,
    body: serde_json::Value,
) -> Response<BoxBody<Bytes, HyperError>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(full(body.to_string()))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(full(r#"{"error":"Internal server error"}"#));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("job listings upstream unreachable: {0}")]
    JobsUpstream(#[from] reqwest::Error),
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Maps the error taxonomy to a status plus `{error, details}` JSON body.
    /// Validation details always name the violated rule (they describe the
    /// client's own input); everything else is redacted unless `expose_detail`
    /// is set, so provider error strings never leak in production.
    pub fn into_response(self, expose_detail: bool) -> Response<BoxBody<Bytes, HyperError>> {
        let (status, error, details) = match &self {
            GatewayError::Validation(err) => {
                (StatusCode::BAD_REQUEST, "Invalid request", err.to_string())
            }
            GatewayError::Dispatch(err) if err.is_rate_limited() => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded",
                redact(
                    expose_detail,
                    err,
                    "All providers are currently rate limited, try again later",
                ),
            ),
            GatewayError::Dispatch(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Chat completion failed",
                redact(expose_detail, err, "All providers failed"),
            ),
            GatewayError::JobsUpstream(err) => (
                StatusCode::BAD_GATEWAY,
                "Job listings are unavailable",
                redact(expose_detail, err, "Upstream request failed"),
            ),
            GatewayError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                redact(expose_detail, err, "Something went wrong"),
            ),
        };

        json_response(status, json!({ "error": error, "details": details }))
    }
}

fn redact(expose_detail: bool, err: &impl ToString, generic: &str) -> String {
    if expose_detail {
        err.to_string()
    } else {
        generic.to_string()
    }
}
