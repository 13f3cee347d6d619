use crate::errors::full;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};

/// Echo-back CORS: the request origin is returned only when it exactly matches
/// an entry in the allow-list.
pub fn resolve_origin(headers: &HeaderMap, allowed_origins: &[String]) -> Option<HeaderValue> {
    let origin = headers.get(header::ORIGIN)?;
    let origin_str = origin.to_str().ok()?;
    if allowed_origins.iter().any(|allowed| allowed == origin_str) {
        Some(origin.clone())
    } else {
        None
    }
}

pub fn apply_cors(
    response: &mut Response<BoxBody<Bytes, hyper::Error>>,
    origin: Option<HeaderValue>,
) {
    if let Some(origin) = origin {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        response
            .headers_mut()
            .insert(header::VARY, HeaderValue::from_static("Origin"));
    }
}

pub fn preflight_response() -> Response<BoxBody<Bytes, hyper::Error>> {
    let mut response = Response::new(full(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_origin(origin: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_str(origin).unwrap());
        headers
    }

    #[test]
    fn test_allowed_origin_is_echoed() {
        let allowed = vec!["http://localhost:5173".to_string()];
        let headers = headers_with_origin("http://localhost:5173");
        assert_eq!(
            resolve_origin(&headers, &allowed),
            Some(HeaderValue::from_static("http://localhost:5173"))
        );
    }

    #[test]
    fn test_unlisted_origin_is_rejected() {
        let allowed = vec!["http://localhost:5173".to_string()];
        let headers = headers_with_origin("https://evil.example");
        assert_eq!(resolve_origin(&headers, &allowed), None);
    }

    #[test]
    fn test_missing_origin_header() {
        let allowed = vec!["http://localhost:5173".to_string()];
        assert_eq!(resolve_origin(&HeaderMap::new(), &allowed), None);
    }

    #[test]
    fn test_apply_cors_sets_headers_only_for_resolved_origin() {
        let mut response = Response::new(full(Bytes::new()));
        apply_cors(&mut response, None);
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        apply_cors(
            &mut response,
            Some(HeaderValue::from_static("http://localhost:5173")),
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(response.headers().get(header::VARY).unwrap(), "Origin");
    }

    #[test]
    fn test_preflight_shape() {
        let response = preflight_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap(),
            "GET, POST, OPTIONS"
        );
    }
}
