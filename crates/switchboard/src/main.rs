use bytes::Bytes;
use common::configuration::Settings;
use common::consts::{CHAT_PATH, HEALTH_PATH, JOBS_PATH, MODELS_PATH};
use http_body_util::{combinators::BoxBody, BodyExt};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::sync::Arc;
use switchboard::errors::json_response;
use switchboard::state::AppState;
use switchboard::{cors, handlers};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let state = Arc::new(AppState::new(settings));
    info!(
        providers = ?state.registry.available(),
        environment = ?state.settings.environment,
        "configured chat providers"
    );

    let listener = TcpListener::bind(("0.0.0.0", state.settings.port)).await?;
    info!(port = state.settings.port, "listening");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);

        let state = Arc::clone(&state);
        let service = service_fn(move |req| {
            let state = Arc::clone(&state);
            async move { route(state, req).await }
        });

        tokio::task::spawn(async move {
            debug!(peer = ?peer_addr, "accepted connection");
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(error = ?err, "error serving connection");
            }
        });
    }
}

async fn route(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = cors::resolve_origin(req.headers(), &state.settings.allowed_origins);
    let expose_detail = state.settings.environment.expose_error_detail();

    // Every handler error funnels through GatewayError::into_response, so a
    // failure anywhere in request handling still produces a well-formed JSON
    // error with detail redacted outside development.
    let mut response = match (req.method(), path.as_str()) {
        (&Method::OPTIONS, _) => cors::preflight_response(),
        (&Method::POST, CHAT_PATH) => {
            let body = req.collect().await?.to_bytes();
            handlers::chat::chat(state, body)
                .await
                .unwrap_or_else(|err| err.into_response(expose_detail))
        }
        (&Method::GET, MODELS_PATH) => handlers::models::list_models(&state)
            .unwrap_or_else(|err| err.into_response(expose_detail)),
        (&Method::GET, HEALTH_PATH) => handlers::health::health(&state),
        (&Method::GET, JOBS_PATH) => handlers::jobs::list_jobs(state)
            .await
            .unwrap_or_else(|err| err.into_response(expose_detail)),
        _ => {
            debug!(method = %method, path = %path, "no route found");
            json_response(
                StatusCode::NOT_FOUND,
                json!({
                    "error": "Not found",
                    "details": format!("No route for {method} {path}"),
                }),
            )
        }
    };

    cors::apply_cors(&mut response, origin);
    Ok(response)
}
