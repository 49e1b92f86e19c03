use axum::{
    extract::State,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::{created_response, AppJson, AppPath},
    services::{checkout::CheckoutRequest, orders::OrderView},
    AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[schema(example = "confirmed")]
    pub status: String,
}

pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/:id/", get(get_order))
        .route("/orders/:id/confirm_order/", patch(confirm_order))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/orders/",
    tag = "Orders",
    responses(
        (status = 200, description = "The caller's orders, newest first", body = [OrderView]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<OrderView>>, ServiceError> {
    let orders = state.services.orders.list_orders(auth_user.user_id).await?;
    Ok(Json(orders))
}

/// Checkout: turns the referenced cart into an order
#[utoipa::path(
    post,
    path = "/api/orders/",
    tag = "Orders",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderView),
        (status = 400, description = "Empty cart, missing customer profile or invalid cart line", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart not found for the caller", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<Response, ServiceError> {
    let order = state
        .services
        .checkout
        .create_order(auth_user.user_id, request)
        .await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its lines", body = OrderView),
        (status = 404, description = "Order not found for the caller", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppPath(order_id): AppPath<Uuid>,
) -> Result<Json<OrderView>, ServiceError> {
    let order = state
        .services
        .orders
        .get_order(auth_user.user_id, order_id)
        .await?;
    Ok(Json(order))
}

/// Staff-only status transition
#[utoipa::path(
    patch,
    path = "/api/orders/{id}/confirm_order/",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderView),
        (status = 400, description = "Unknown status or illegal transition", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not staff", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn confirm_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppPath(order_id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateOrderStatusRequest>,
) -> Result<Json<OrderView>, ServiceError> {
    let order = state
        .services
        .order_status
        .transition(order_id, &request.status, &auth_user)
        .await?;
    Ok(Json(order))
}
