use axum::{extract::State, response::Response, routing::post, Json, Router};

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, AppJson},
    services::accounts::{AuthResponse, LoginRequest, RegisterRequest},
    AppState,
};

/// Authentication routes; no token required
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register/", post(register))
        .route("/auth/login/", post(login))
}

#[utoipa::path(
    post,
    path = "/api/auth/register/",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid or duplicate registration", body = crate::errors::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<Response, ServiceError> {
    let response = state.services.accounts.register(request).await?;
    Ok(created_response(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/login/",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    Ok(Json(state.services.accounts.login(request).await?))
}
