#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use ordering_api::{
    build_router,
    config::AppConfig,
    db,
    events,
    notifications::{MailMessage, Mailer, NotificationError},
    services::{
        accounts::{AuthResponse, RegisterRequest},
        catalog::{Characteristic, CreateProductRequest, CreateSupplierRequest, ProductView},
        customers::UpsertProfileRequest,
    },
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

/// Mailer double that keeps every message and can be switched to fail
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages_with_subject_prefix(&self, prefix: &str) -> Vec<MailMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.subject.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Transport("smtp unavailable".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// A registered user and the bearer token issued at registration
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// Application harness backed by a throwaway SQLite file
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    _event_task: tokio::task::JoinHandle<()>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_mailer(RecordingMailer::default()).await
    }

    pub async fn with_mailer(mailer: RecordingMailer) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("ordering_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 4;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let mailer = Arc::new(mailer);
        let state = AppState::new(Arc::new(pool), cfg, event_sender, mailer.clone());
        let router = build_router(state.clone());

        Self {
            router,
            state,
            mailer,
            _event_task: event_task,
            _dir: dir,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn register(&self, username: &str) -> TestUser {
        let response = self
            .state
            .services
            .accounts
            .register(register_request(username))
            .await
            .expect("register test user");
        into_test_user(response)
    }

    pub async fn register_staff(&self, username: &str) -> TestUser {
        let response = self
            .state
            .services
            .accounts
            .register_staff(register_request(username))
            .await
            .expect("register staff user");
        into_test_user(response)
    }

    /// A customer with a default address and phone on file
    pub async fn register_customer(&self, username: &str) -> TestUser {
        let user = self.register(username).await;
        self.state
            .services
            .customers
            .upsert_profile(
                user.id,
                UpsertProfileRequest {
                    address: Some(format!("{} Main Street", username)),
                    phone: Some("+15550100".to_string()),
                },
            )
            .await
            .expect("create customer profile");
        user
    }

    pub async fn seed_supplier(&self, name: &str) -> Uuid {
        self.state
            .services
            .catalog
            .create_supplier(CreateSupplierRequest {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .expect("seed supplier")
            .id
    }

    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        supplier_id: Option<Uuid>,
    ) -> ProductView {
        self.state
            .services
            .catalog
            .create_product(CreateProductRequest {
                name: name.to_string(),
                description: Some(format!("{} for tests", name)),
                price,
                supplier_id,
                category_id: None,
                stock_quantity: 10,
                characteristics: vec![Characteristic {
                    attribute_name: "Color".to_string(),
                    value: "Black".to_string(),
                }],
            })
            .await
            .expect("seed product")
    }

    /// Adds a line through the service layer and returns the cart id
    pub async fn add_to_cart(&self, user: &TestUser, product_id: Uuid, quantity: i32) -> Uuid {
        self.state
            .services
            .cart
            .add_or_increment(user.id, product_id, quantity)
            .await
            .expect("add to cart");
        self.state
            .services
            .cart
            .view(user.id)
            .await
            .expect("view cart")
            .id
            .expect("cart exists after adding")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

fn register_request(username: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "correct-horse-battery".to_string(),
        password_confirm: Some("correct-horse-battery".to_string()),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

fn into_test_user(response: AuthResponse) -> TestUser {
    TestUser {
        id: response.user.id,
        username: response.user.username,
        token: response.token,
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
