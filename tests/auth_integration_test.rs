mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

fn registration(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "s3cure-passphrase",
        "password_confirm": "s3cure-passphrase",
        "first_name": "Ada",
        "last_name": "Lovelace"
    })
}

#[tokio::test]
async fn register_then_login_issues_usable_tokens() {
    let app = TestApp::new().await;

    let registered = app
        .request(
            Method::POST,
            "/api/auth/register/",
            Some(registration("ada")),
            None,
        )
        .await;
    assert_eq!(registered.status(), StatusCode::CREATED);
    let body = response_json(registered).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["user"]["is_staff"], false);
    assert!(body["user"].get("password_hash").is_none());

    let login = app
        .request(
            Method::POST,
            "/api/auth/login/",
            Some(json!({ "username": "ada", "password": "s3cure-passphrase" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let token = response_json(login).await["token"]
        .as_str()
        .expect("token string")
        .to_string();

    let cart = app
        .request(Method::GET, "/api/cart/", None, Some(&token))
        .await;
    assert_eq!(cart.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_sends_a_confirmation_mail() {
    let app = TestApp::new().await;
    app.register("mailme").await;

    let sent = app.mailer.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "mailme@example.com");
    assert_eq!(sent[0].subject, "Registration confirmed");
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::new().await;
    app.register("taken").await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/register/",
            Some(registration("taken")),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["details"], "validation_error");
}

#[tokio::test]
async fn weak_or_mismatched_passwords_are_rejected() {
    let app = TestApp::new().await;

    let mut short = registration("shorty");
    short["password"] = json!("abc");
    short["password_confirm"] = json!("abc");
    let response = app
        .request(Method::POST, "/api/auth/register/", Some(short), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut mismatch = registration("mismatch");
    mismatch["password_confirm"] = json!("something-else");
    let response = app
        .request(Method::POST, "/api/auth/register/", Some(mismatch), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_email = registration("bademail");
    bad_email["email"] = json!("not-an-email");
    let response = app
        .request(Method::POST, "/api/auth/register/", Some(bad_email), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register("eve").await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login/",
            Some(json!({ "username": "eve", "password": "wrong-password" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/auth/login/",
            Some(json!({ "username": "nobody", "password": "whatever-123" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customer_profile_round_trip() {
    let app = TestApp::new().await;
    let user = app.register("zoe").await;

    let missing = app
        .request(Method::GET, "/api/customers/me/", None, Some(&user.token))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let saved = app
        .request(
            Method::PUT,
            "/api/customers/me/",
            Some(json!({ "address": " 5 Elm Street ", "phone": "+15550199" })),
            Some(&user.token),
        )
        .await;
    assert_eq!(saved.status(), StatusCode::OK);

    let updated = app
        .request(
            Method::PUT,
            "/api/customers/me/",
            Some(json!({ "address": "7 Oak Avenue" })),
            Some(&user.token),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);

    let profile = response_json(
        app.request(Method::GET, "/api/customers/me/", None, Some(&user.token))
            .await,
    )
    .await;
    assert_eq!(profile["address"], "7 Oak Avenue");
    assert_eq!(profile["user_id"], json!(user.id));
}
