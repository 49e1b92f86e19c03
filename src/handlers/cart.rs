use axum::{
    extract::State,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::{
        created_response, no_content_response, success_response, AppJson, AppPath,
    },
    services::cart::{CartLineView, CartView},
    AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[schema(example = 2)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// Zero or less removes the line
    #[schema(example = 3)]
    pub quantity: i32,
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/", get(get_cart))
        .route("/cart/items/", post(add_cart_item))
        .route(
            "/cart/items/:id/",
            put(update_cart_item)
                .patch(update_cart_item)
                .delete(remove_cart_item),
        )
        .with_auth()
}

/// The caller's cart; an empty shape when none exists yet
#[utoipa::path(
    get,
    path = "/api/cart/",
    tag = "Cart",
    responses(
        (status = 200, description = "Current cart", body = CartView),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_cart(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<CartView>, ServiceError> {
    let view = state.services.cart.view(auth_user.user_id).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/cart/items/",
    tag = "Cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Line added or incremented", body = CartLineView),
        (status = 400, description = "Unknown product or non-positive quantity", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn add_cart_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(request): AppJson<AddCartItemRequest>,
) -> Result<Response, ServiceError> {
    let line = state
        .services
        .cart
        .add_or_increment(auth_user.user_id, request.product_id, request.quantity)
        .await?;
    Ok(created_response(line))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{id}/",
    tag = "Cart",
    params(("id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = CartLineView),
        (status = 204, description = "Quantity was zero or less; line removed"),
        (status = 404, description = "No such line in the caller's cart", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateCartItemRequest>,
) -> Result<Response, ServiceError> {
    let updated = state
        .services
        .cart
        .set_quantity(auth_user.user_id, item_id, request.quantity)
        .await?;
    Ok(match updated {
        Some(line) => success_response(line),
        None => no_content_response(),
    })
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}/",
    tag = "Cart",
    params(("id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "No such line in the caller's cart", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppPath(item_id): AppPath<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .services
        .cart
        .remove_item(auth_user.user_id, item_id)
        .await?;
    Ok(no_content_response())
}
