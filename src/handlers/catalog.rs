use axum::{
    extract::State,
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, AppJson, AppPath},
    services::catalog::{CategoryView, CreateProductRequest, ProductView, SupplierView},
    AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdatePriceRequest {
    #[schema(value_type = String, example = "199.99")]
    pub price: Decimal,
}

/// Public read routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", get(list_products))
        .route("/products/:id/", get(get_product))
        .route("/categories/", get(list_categories))
        .route("/suppliers/", get(list_suppliers))
}

/// Staff-only write routes
pub fn catalog_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", post(create_product))
        .route(
            "/products/:id/",
            patch(update_product_price).delete(delete_product),
        )
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/products/",
    tag = "Catalog",
    responses((status = 200, description = "All products", body = [ProductView]))
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductView>>, ServiceError> {
    Ok(Json(state.services.catalog.list_products().await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductView),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<Uuid>,
) -> Result<Json<ProductView>, ServiceError> {
    Ok(Json(state.services.catalog.get_product(product_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/",
    tag = "Catalog",
    responses((status = 200, description = "All categories", body = [CategoryView]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryView>>, ServiceError> {
    Ok(Json(state.services.catalog.list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/suppliers/",
    tag = "Catalog",
    responses((status = 200, description = "All suppliers", body = [SupplierView]))
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
) -> Result<Json<Vec<SupplierView>>, ServiceError> {
    Ok(Json(state.services.catalog.list_suppliers().await?))
}

#[utoipa::path(
    post,
    path = "/api/products/",
    tag = "Catalog",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductView),
        (status = 400, description = "Invalid product", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not staff", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(request): AppJson<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    auth_user.require_admin()?;
    let product = state.services.catalog.create_product(request).await?;
    Ok(created_response(product))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}/",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdatePriceRequest,
    responses(
        (status = 200, description = "Price updated", body = ProductView),
        (status = 403, description = "Caller is not staff", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn update_product_price(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppPath(product_id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdatePriceRequest>,
) -> Result<Json<ProductView>, ServiceError> {
    auth_user.require_admin()?;
    let product = state
        .services
        .catalog
        .update_product_price(product_id, request.price)
        .await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Caller is not staff", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppPath(product_id): AppPath<Uuid>,
) -> Result<Response, ServiceError> {
    auth_user.require_admin()?;
    state.services.catalog.delete_product(product_id).await?;
    Ok(no_content_response())
}
