use crate::tracing::{scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller-supplied id, or a fresh one when the header is absent, blank or not ASCII
fn incoming_request_id(headers: &HeaderMap) -> RequestId {
    match headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
    {
        Some(id) if !id.is_empty() => RequestId::new(id),
        _ => RequestId::default(),
    }
}

/// Scopes the rest of the stack to one request id and echoes it back.
///
/// Handlers read the id through `current_request_id`; log lines carry it via
/// the enclosing `request` span.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = incoming_request_id(request.headers());
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = scope_request_id(request_id.clone(), next.run(request))
        .instrument(span)
        .await;

    match HeaderValue::from_str(request_id.as_str()) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        Err(_) => tracing::debug!(request_id = %request_id, "request id not echoed"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::ServiceExt;

    async fn echo_scoped_id() -> String {
        crate::tracing::current_request_id()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    async fn call(header: Option<&str>) -> (Option<String>, String) {
        let router = Router::new()
            .route("/", get(echo_scoped_id))
            .layer(axum::middleware::from_fn(request_id_middleware));
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let echoed = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (echoed, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn caller_id_is_scoped_and_echoed() {
        let (echoed, scoped) = call(Some("checkout-7")).await;
        assert_eq!(echoed.as_deref(), Some("checkout-7"));
        assert_eq!(scoped, "checkout-7");
    }

    #[tokio::test]
    async fn missing_or_blank_header_gets_a_generated_id() {
        for header in [None, Some("   ")] {
            let (echoed, scoped) = call(header).await;
            let echoed = echoed.expect("id header always set");
            assert!(uuid::Uuid::parse_str(&echoed).is_ok());
            assert_eq!(scoped, echoed);
        }
    }

    #[test]
    fn surrounding_whitespace_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(" abc "));
        assert_eq!(incoming_request_id(&headers).as_str(), "abc");
    }
}
