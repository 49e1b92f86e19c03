//! Integration tests for checkout: cart → order conversion over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use ordering_api::entities::{cart, order, order_item};
use ordering_api::repositories::CartRepository;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait, TransactionTrait};
use serde_json::json;

async fn order_count(app: &TestApp) -> u64 {
    order::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count orders")
}

#[tokio::test]
async fn checkout_snapshots_cart_into_order() {
    let app = TestApp::new().await;
    let acme = app.seed_supplier("Acme Audio").await;
    let speaker = app.seed_product("Speaker", dec!(150.50), Some(acme)).await;
    let cable = app.seed_product("Cable", dec!(200.00), None).await;

    let alice = app.register_customer("alice").await;
    app.add_to_cart(&alice, speaker.id, 1).await;
    let cart_id = app.add_to_cart(&alice, cable.id, 2).await;

    let response = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["status"], "new");
    assert_eq!(body["total_amount"], "550.50");
    assert_eq!(body["shipping_address"], "alice Main Street");
    assert_eq!(body["phone_number"], "+15550100");

    let items = body["items"].as_array().expect("items array");
    assert_eq!(items.len(), 2);
    let speaker_line = items
        .iter()
        .find(|i| i["product_name"] == "Speaker")
        .expect("speaker line");
    assert_eq!(speaker_line["supplier_name"], "Acme Audio");
    assert_eq!(speaker_line["price"], "150.50");
    assert_eq!(speaker_line["quantity"], 1);
    let cable_line = items
        .iter()
        .find(|i| i["product_name"] == "Cable")
        .expect("cable line");
    assert_eq!(cable_line["supplier_name"], "Unknown Supplier");
    assert_eq!(cable_line["total_price"], "400.00");
}

#[tokio::test]
async fn request_address_overrides_profile_default() {
    let app = TestApp::new().await;
    let product = app.seed_product("Lamp", dec!(20.00), None).await;
    let bob = app.register_customer("bob").await;
    let cart_id = app.add_to_cart(&bob, product.id, 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({
                "cart_id": cart_id,
                "shipping_address": "1 Harbour Road",
                "phone_number": "  "
            })),
            Some(&bob.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["shipping_address"], "1 Harbour Road");
    assert_eq!(body["phone_number"], "+15550100");
}

#[tokio::test]
async fn checkout_consumes_the_cart() {
    let app = TestApp::new().await;
    let product = app.seed_product("Desk", dec!(99.99), None).await;
    let carol = app.register_customer("carol").await;
    let cart_id = app.add_to_cart(&carol, product.id, 3).await;

    let first = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&carol.token),
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    assert!(cart::Entity::find_by_id(cart_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .is_none());

    let cart_view = app
        .request(Method::GET, "/api/cart/", None, Some(&carol.token))
        .await;
    assert_eq!(cart_view.status(), StatusCode::OK);
    let body = response_json(cart_view).await;
    assert!(body["id"].is_null());
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total_price"], "0.00");

    // Re-submitting the same cart finds nothing to check out
    let second = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&carol.token),
        )
        .await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert_eq!(order_count(&app).await, 1);
}

#[tokio::test]
async fn cart_removal_reports_a_cart_already_consumed() {
    let app = TestApp::new().await;
    let product = app.seed_product("Tuner", dec!(90.00), None).await;
    let gus = app.register_customer("gus").await;
    let cart_id = app.add_to_cart(&gus, product.id, 1).await;

    let stale = cart::Entity::find_by_id(cart_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("cart row");

    let txn = app.state.db.begin().await.unwrap();
    let carts = CartRepository::new(&txn);
    assert!(carts.delete_with_items(stale.clone()).await.unwrap());
    // A second checkout holding the same snapshot must see nothing removed
    assert!(!carts.delete_with_items(stale).await.unwrap());
    txn.rollback().await.unwrap();

    let placed = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&gus.token),
        )
        .await;
    assert_eq!(placed.status(), StatusCode::CREATED);
    assert_eq!(order_count(&app).await, 1);
}

#[tokio::test]
async fn empty_cart_is_rejected_without_creating_an_order() {
    let app = TestApp::new().await;
    let product = app.seed_product("Chair", dec!(45.00), None).await;
    let dave = app.register_customer("dave").await;
    let cart_id = app.add_to_cart(&dave, product.id, 1).await;

    let line_id = app.state.services.cart.view(dave.id).await.unwrap().items[0].id;
    app.state
        .services
        .cart
        .set_quantity(dave.id, line_id, 0)
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&dave.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["details"], "empty_cart");
    assert_eq!(order_count(&app).await, 0);

    // The rolled-back attempt leaves the cart in place
    assert!(cart::Entity::find_by_id(cart_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn missing_customer_profile_is_a_precondition_failure() {
    let app = TestApp::new().await;
    let product = app.seed_product("Mug", dec!(8.25), None).await;
    let erin = app.register("erin").await;
    let cart_id = app.add_to_cart(&erin, product.id, 2).await;

    let response = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&erin.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["details"], "customer_profile_missing");
    assert_eq!(order_count(&app).await, 0);

    let cart_view = app.state.services.cart.view(erin.id).await.unwrap();
    assert_eq!(cart_view.items.len(), 1);
}

#[tokio::test]
async fn deleted_product_in_cart_fails_checkout_atomically() {
    let app = TestApp::new().await;
    let kept = app.seed_product("Pen", dec!(2.00), None).await;
    let gone = app.seed_product("Ink", dec!(5.00), None).await;
    let frank = app.register_customer("frank").await;
    app.add_to_cart(&frank, kept.id, 1).await;
    let cart_id = app.add_to_cart(&frank, gone.id, 1).await;

    app.state
        .services
        .catalog
        .delete_product(gone.id)
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&frank.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["details"], "invalid_cart_item");

    assert_eq!(order_count(&app).await, 0);
    assert_eq!(
        order_item::Entity::find()
            .count(&*app.state.db)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn cannot_check_out_another_users_cart() {
    let app = TestApp::new().await;
    let product = app.seed_product("Rug", dec!(120.00), None).await;
    let owner = app.register_customer("grace").await;
    let intruder = app.register_customer("heidi").await;
    let cart_id = app.add_to_cart(&owner, product.id, 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&intruder.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(order_count(&app).await, 0);
}

#[tokio::test]
async fn order_lines_keep_their_price_after_catalog_changes() {
    let app = TestApp::new().await;
    let product = app.seed_product("Clock", dec!(30.00), None).await;
    let ivan = app.register_customer("ivan").await;
    let cart_id = app.add_to_cart(&ivan, product.id, 2).await;

    let placed = app
        .state
        .services
        .checkout
        .create_order(
            ivan.id,
            ordering_api::services::checkout::CheckoutRequest {
                cart_id,
                shipping_address: None,
                phone_number: None,
            },
        )
        .await
        .expect("checkout succeeds");

    app.state
        .services
        .catalog
        .update_product_price(product.id, dec!(45.00))
        .await
        .unwrap();
    app.state
        .services
        .catalog
        .delete_product(product.id)
        .await
        .unwrap();

    let response = app
        .request(
            Method::GET,
            &format!("/api/orders/{}/", placed.id),
            None,
            Some(&ivan.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["total_amount"], "60.00");
    assert_eq!(body["items"][0]["price"], "30.00");
    assert_eq!(body["items"][0]["product_name"], "Clock");
    assert!(body["items"][0]["product_id"].is_null());
}

#[tokio::test]
async fn order_lines_are_listed_in_cart_order() {
    let app = TestApp::new().await;
    let names = ["Turntable", "Amplifier", "Needle", "Cartridge", "Belt"];
    let judy = app.register_customer("judy").await;
    let mut cart_id = None;
    for name in names {
        let product = app.seed_product(name, dec!(10.00), None).await;
        cart_id = Some(app.add_to_cart(&judy, product.id, 1).await);
    }

    let placed = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": cart_id })),
            Some(&judy.token),
        )
        .await;
    assert_eq!(placed.status(), StatusCode::CREATED);
    let placed = response_json(placed).await;

    let line_names = |order: &serde_json::Value| -> Vec<String> {
        order["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["product_name"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(line_names(&placed), names);

    let detail = response_json(
        app.request(
            Method::GET,
            &format!("/api/orders/{}/", placed["id"].as_str().unwrap()),
            None,
            Some(&judy.token),
        )
        .await,
    )
    .await;
    assert_eq!(line_names(&detail), names);

    let listed = response_json(
        app.request(Method::GET, "/api/orders/", None, Some(&judy.token))
            .await,
    )
    .await;
    assert_eq!(line_names(&listed[0]), names);
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/orders/",
            Some(json!({ "cart_id": uuid::Uuid::new_v4() })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
