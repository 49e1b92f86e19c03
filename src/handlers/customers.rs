use axum::{extract::State, routing::get, Json, Router};

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::AppJson,
    services::customers::{CustomerProfile, UpsertProfileRequest},
    AppState,
};

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/customers/me/", get(get_profile).put(upsert_profile))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/customers/me/",
    tag = "Customers",
    responses(
        (status = 200, description = "The caller's profile", body = CustomerProfile),
        (status = 404, description = "No profile yet", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<CustomerProfile>, ServiceError> {
    Ok(Json(
        state.services.customers.get_profile(auth_user.user_id).await?,
    ))
}

/// Creates or replaces the caller's default shipping/contact data
#[utoipa::path(
    put,
    path = "/api/customers/me/",
    tag = "Customers",
    request_body = UpsertProfileRequest,
    responses((status = 200, description = "Profile saved", body = CustomerProfile)),
    security(("Bearer" = []))
)]
pub async fn upsert_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(request): AppJson<UpsertProfileRequest>,
) -> Result<Json<CustomerProfile>, ServiceError> {
    Ok(Json(
        state
            .services
            .customers
            .upsert_profile(auth_user.user_id, request)
            .await?,
    ))
}
