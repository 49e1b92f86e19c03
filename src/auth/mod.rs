/*!
 * # Authentication and Authorization
 *
 * Bearer-token authentication for the ordering API.
 *
 * - HS256 JWT access tokens issued at login and registration
 * - argon2 password hashing (see [`password`])
 * - `auth_middleware` validates the token and stores an [`AuthUser`] in the
 *   request extensions; handlers take `AuthUser` as an extractor
 *
 * Staff users carry the `admin` role, which is what the privileged order
 * status operations check for.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{config::AppConfig, entities::user, errors::ServiceError};

pub mod password;

pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_ADMIN: &str = "admin";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // Subject (user ID)
    pub username: String,   // Login name
    pub roles: Vec<String>, // "customer", plus "admin" for staff
    pub jti: String,        // JWT ID
    pub iat: i64,           // Issued at time
    pub exp: i64,           // Expiration time
    pub iss: String,        // Issuer
    pub aud: String,        // Audience
}

/// Authenticated caller, extracted from a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Privileged actor check used by the order status gate and catalog writes
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "this action requires a staff account".to_string(),
            ))
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )
    }
}

/// Issues and validates access tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn token_lifetime(&self) -> Duration {
        self.config.access_token_expiration
    }

    /// Generate a signed access token for a user
    pub fn issue_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let mut roles = vec![ROLE_CUSTOMER.to_string()];
        if user.is_staff {
            roles.push(ROLE_ADMIN.to_string());
        }

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            roles,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            username: claims.username,
            roles: claims.roles,
            token_id: claims.jti,
        })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token creation error: {0}")]
    TokenCreation(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => {
                ServiceError::Unauthorized("Authentication required".to_string())
            }
            AuthError::InvalidCredentials => {
                ServiceError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::InvalidToken => ServiceError::JwtError("Invalid token".to_string()),
            AuthError::TokenExpired => ServiceError::JwtError("Token has expired".to_string()),
            AuthError::TokenCreation(msg) | AuthError::InternalError(msg) => {
                ServiceError::InternalError(msg)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            debug!(user_id = %user.user_id, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingAuth)?;

    auth_service.authenticate(token)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service(secret: &str) -> AuthService {
        AuthService::new(AuthConfig::new(
            secret.to_string(),
            "ordering-api".to_string(),
            "ordering-auth".to_string(),
            Duration::from_secs(3600),
        ))
    }

    fn user(is_staff: bool) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_authenticates_as_the_user() {
        let auth = service("0123456789abcdef0123456789abcdef-test");
        let bob = user(false);
        let token = auth.issue_token(&bob).unwrap();

        let caller = auth.authenticate(&token).unwrap();
        assert_eq!(caller.user_id, bob.id);
        assert_eq!(caller.username, "bob");
        assert!(caller.has_role(ROLE_CUSTOMER));
        assert!(!caller.is_admin());
        assert_matches!(caller.require_admin(), Err(ServiceError::Forbidden(_)));
    }

    #[test]
    fn staff_tokens_carry_admin_role() {
        let auth = service("0123456789abcdef0123456789abcdef-test");
        let token = auth.issue_token(&user(true)).unwrap();
        let caller = auth.authenticate(&token).unwrap();
        assert!(caller.is_admin());
        assert!(caller.require_admin().is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = service("first-secret-0123456789abcdef012345")
            .issue_token(&user(false))
            .unwrap();
        let err = service("other-secret-0123456789abcdef012345")
            .authenticate(&token)
            .unwrap_err();
        assert_matches!(err, AuthError::InvalidToken);
    }

    #[test]
    fn header_must_carry_a_bearer_token() {
        let auth = service("0123456789abcdef0123456789abcdef-test");
        let mut headers = HeaderMap::new();
        assert_matches!(
            extract_auth_from_headers(&headers, &auth),
            Err(AuthError::MissingAuth)
        );

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_matches!(
            extract_auth_from_headers(&headers, &auth),
            Err(AuthError::MissingAuth)
        );

        let token = auth.issue_token(&user(false)).unwrap();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        assert!(extract_auth_from_headers(&headers, &auth).is_ok());
    }
}
