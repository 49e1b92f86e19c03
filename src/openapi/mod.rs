use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ordering API",
        version = "0.1.0",
        description = r#"
# Ordering API

Catalog browsing, a per-user shopping cart and order placement.

## Authentication

Cart, order and profile endpoints require a bearer token obtained from
`/api/auth/login/` or `/api/auth/register/`:

```
Authorization: Bearer <token>
```

Status transitions on orders require a staff account.

## Error Handling

Failures share one body shape; `details` is a stable machine-readable kind:

```json
{
  "error": "Bad Request",
  "message": "Cart is empty: cart 550e8400-e29b-41d4-a716-446655440000 has no items",
  "details": "empty_cart",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Catalog", description = "Products, categories and suppliers"),
        (name = "Cart", description = "The caller's shopping cart"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Customers", description = "Customer profile"),
        (name = "Auth", description = "Registration and login"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Catalog
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product,
        crate::handlers::catalog::list_categories,
        crate::handlers::catalog::list_suppliers,
        crate::handlers::catalog::create_product,
        crate::handlers::catalog::update_product_price,
        crate::handlers::catalog::delete_product,

        // Cart
        crate::handlers::cart::get_cart,
        crate::handlers::cart::add_cart_item,
        crate::handlers::cart::update_cart_item,
        crate::handlers::cart::remove_cart_item,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::confirm_order,

        // Customers & auth
        crate::handlers::customers::get_profile,
        crate::handlers::customers::upsert_profile,
        crate::handlers::auth::register,
        crate::handlers::auth::login,

        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::entities::OrderStatus,
            crate::services::orders::OrderView,
            crate::services::orders::OrderItemView,
            crate::services::cart::CartView,
            crate::services::cart::CartLineView,
            crate::services::catalog::ProductView,
            crate::services::catalog::Characteristic,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths_and_bearer_scheme() {
        let json = ApiDocV1::openapi().to_json().unwrap();
        assert!(json.contains("Ordering API"));
        assert!(json.contains("/api/orders/"));
        assert!(json.contains("/api/orders/{id}/confirm_order/"));
        assert!(json.contains("/api/cart/items/"));
        assert!(json.contains("\"Bearer\""));
    }
}
