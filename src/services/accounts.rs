use crate::{
    auth::{
        password::{hash_password, verify_password, MIN_PASSWORD_LENGTH},
        AuthError, AuthService,
    },
    db::DbPool,
    entities::user,
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::NotificationService,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    pub password: String,
    pub password_confirm: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserView {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            is_staff: m.is_staff,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserView,
}

/// User/credential store
#[derive(Clone)]
pub struct AccountService {
    db_pool: Arc<DbPool>,
    auth: Arc<AuthService>,
    notifications: NotificationService,
    event_sender: Arc<EventSender>,
}

impl AccountService {
    pub fn new(
        db_pool: Arc<DbPool>,
        auth: Arc<AuthService>,
        notifications: NotificationService,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db_pool,
            auth,
            notifications,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        self.create_user(request, false).await
    }

    /// Registers a staff account; used by the bootstrap path and tests
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register_staff(
        &self,
        request: RegisterRequest,
    ) -> Result<AuthResponse, ServiceError> {
        self.create_user(request, true).await
    }

    async fn create_user(
        &self,
        request: RegisterRequest,
        is_staff: bool,
    ) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if let Some(confirm) = &request.password_confirm {
            if confirm != &request.password {
                return Err(ServiceError::ValidationError(
                    "Passwords do not match".to_string(),
                ));
            }
        }
        let db = &*self.db_pool;
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        let taken = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username.clone()))
                    .add(user::Column::Email.eq(email.clone())),
            )
            .one(db)
            .await?;
        if let Some(existing) = taken {
            let field = if existing.username == username {
                "username"
            } else {
                "email"
            };
            return Err(ServiceError::ValidationError(format!(
                "A user with that {} already exists",
                field
            )));
        }

        let now = Utc::now();
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(hash_password(&request.password)?),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            is_staff: Set(is_staff),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(user_id = %created.id, is_staff, "User registered");
        if let Err(e) = self.notifications.registration_confirmation(&created).await {
            warn!(user_id = %created.id, error = %e, "Registration mail failed");
        }
        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;

        self.respond(created)
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        request
            .validate()
            .map_err(|_| ServiceError::from(AuthError::InvalidCredentials))?;

        let found = user::Entity::find()
            .filter(user::Column::Username.eq(request.username.trim()))
            .one(&*self.db_pool)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &found.password_hash)? {
            warn!(user_id = %found.id, "Login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        self.respond(found)
    }

    fn respond(&self, account: user::Model) -> Result<AuthResponse, ServiceError> {
        let token = self.auth.issue_token(&account)?;
        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.auth.token_lifetime().as_secs(),
            user: account.into(),
        })
    }
}
