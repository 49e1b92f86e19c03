//! Catalog browsing, health probes and the API documentation surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["checks"]["database"], "up");

    let live = app.request(Method::GET, "/health/live", None, None).await;
    assert_eq!(live.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_endpoint_carries_request_id() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/status", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["service"], "ordering-api");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = response_json(response).await;
    assert!(doc["paths"]["/api/orders/"].is_object());
}

#[tokio::test]
async fn catalog_is_public_and_shows_supplier_and_characteristics() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Northwind").await;
    let product = app.seed_product("Amplifier", dec!(150.50), Some(supplier)).await;

    let list = app.request(Method::GET, "/api/products/", None, None).await;
    assert_eq!(list.status(), StatusCode::OK);
    let products = response_json(list).await;
    assert_eq!(products.as_array().unwrap().len(), 1);

    let detail = response_json(
        app.request(
            Method::GET,
            &format!("/api/products/{}/", product.id),
            None,
            None,
        )
        .await,
    )
    .await;
    assert_eq!(detail["name"], "Amplifier");
    assert_eq!(detail["price"], "150.50");
    assert_eq!(detail["supplier"], "Northwind");
    assert_eq!(
        detail["characteristics"],
        json!([{ "attribute_name": "Color", "value": "Black" }])
    );

    let suppliers = response_json(
        app.request(Method::GET, "/api/suppliers/", None, None)
            .await,
    )
    .await;
    assert_eq!(suppliers[0]["name"], "Northwind");

    let missing = app
        .request(
            Method::GET,
            &format!("/api/products/{}/", uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_writes_are_staff_only() {
    let app = TestApp::new().await;
    let customer = app.register("customer").await;
    let staff = app.register_staff("staff").await;
    let payload = json!({
        "name": "Subwoofer",
        "price": "310.00",
        "stock_quantity": 4,
        "characteristics": [{ "attribute_name": "Power", "value": "300W" }]
    });

    let anonymous = app
        .request(Method::POST, "/api/products/", Some(payload.clone()), None)
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let forbidden = app
        .request(
            Method::POST,
            "/api/products/",
            Some(payload.clone()),
            Some(&customer.token),
        )
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let created = app
        .request(
            Method::POST,
            "/api/products/",
            Some(payload),
            Some(&staff.token),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let product = response_json(created).await;
    assert_eq!(product["supplier"], json!(null));

    let repriced = app
        .request(
            Method::PATCH,
            &format!("/api/products/{}/", product["id"].as_str().unwrap()),
            Some(json!({ "price": "299.99" })),
            Some(&staff.token),
        )
        .await;
    assert_eq!(repriced.status(), StatusCode::OK);
    assert_eq!(response_json(repriced).await["price"], "299.99");

    let negative = app
        .request(
            Method::PATCH,
            &format!("/api/products/{}/", product["id"].as_str().unwrap()),
            Some(json!({ "price": "-1.00" })),
            Some(&staff.token),
        )
        .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/products/{}/", product["id"].as_str().unwrap()),
            None,
            Some(&staff.token),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}
