use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::ServiceError;

/// JSON body extractor whose rejections render as `ServiceError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct AppJson<T>(pub T);

/// Path extractor whose rejections render as `ServiceError`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServiceError))]
pub struct AppPath<T>(pub T);

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Quantity {
        quantity: i32,
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let AppJson(parsed) =
            AppJson::<Quantity>::from_request(json_request(r#"{"quantity": 2}"#), &())
                .await
                .unwrap();
        assert_eq!(parsed.quantity, 2);
    }

    #[tokio::test]
    async fn malformed_body_becomes_validation_error() {
        let err =
            AppJson::<Quantity>::from_request(json_request(r#"{"quantity": "two"}"#), &())
                .await
                .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
