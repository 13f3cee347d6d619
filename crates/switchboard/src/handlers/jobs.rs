use crate::errors::{full, GatewayError};
use crate::state::AppState;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

/// Thin pass-through to the external job-listing API: upstream status and
/// JSON body are forwarded as-is. Only transport failures become gateway
/// errors.
pub async fn list_jobs(
    state: Arc<AppState>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, GatewayError> {
    debug!(url = %state.settings.jobs_api_url, "fetching job listings");

    let upstream = state
        .http
        .get(&state.settings.jobs_api_url)
        .send()
        .await
        .map_err(GatewayError::JobsUpstream)?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = upstream.bytes().await.map_err(GatewayError::JobsUpstream)?;

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(full(body))
        .map_err(|err| GatewayError::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatBackend, ChatReply, ProviderError};
    use async_trait::async_trait;
    use common::configuration::Settings;
    use common::providers::ProviderId;
    use http_body_util::BodyExt;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    struct NoopBackend;

    #[async_trait]
    impl ChatBackend for NoopBackend {
        async fn invoke(
            &self,
            provider: ProviderId,
            _message: &str,
        ) -> Result<ChatReply, ProviderError> {
            Err(ProviderError::not_configured(provider))
        }
    }

    fn state_with_jobs_url(url: String) -> Arc<AppState> {
        let mut settings = Settings::for_tests(&[(ProviderId::OpenAI, "key")]);
        settings.jobs_api_url = url;
        Arc::new(AppState::with_backend(settings, Arc::new(NoopBackend)))
    }

    #[tokio::test]
    async fn test_upstream_body_and_status_are_forwarded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/remote-jobs")
            .with_status(200)
            .with_body(r#"{"jobs":[{"title":"Rust Engineer"}]}"#)
            .create_async()
            .await;

        let state = state_with_jobs_url(format!("{}/api/remote-jobs", server.url()));
        let response = list_jobs(state).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["jobs"][0]["title"], "Rust Engineer");
    }

    #[tokio::test]
    async fn test_upstream_error_status_passes_through() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/remote-jobs")
            .with_status(503)
            .with_body(r#"{"error":"maintenance"}"#)
            .create_async()
            .await;

        let state = state_with_jobs_url(format!("{}/api/remote-jobs", server.url()));
        let response = list_jobs(state).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_a_gateway_error() {
        // nothing listens on this port
        let state = state_with_jobs_url("http://127.0.0.1:9/api/remote-jobs".to_string());
        let err = list_jobs(state).await.unwrap_err();
        assert!(matches!(err, GatewayError::JobsUpstream(_)));
    }
}
