use crate::{
    common::serialize_money,
    db::DbPool,
    entities::{order, order_item, OrderStatus},
    errors::ServiceError,
    repositories::OrderRepository,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Snapshot line as returned to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemView {
    pub id: Uuid,
    /// `null` once the product has been removed from the catalog
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub supplier_name: String,
    #[serde(serialize_with = "serialize_money")]
    #[schema(value_type = String, example = "150.50")]
    pub price: Decimal,
    pub quantity: i32,
    #[serde(serialize_with = "serialize_money")]
    #[schema(value_type = String, example = "150.50")]
    pub total_price: Decimal,
}

impl From<order_item::Model> for OrderItemView {
    fn from(item: order_item::Model) -> Self {
        let total_price = item.line_total();
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            supplier_name: item.supplier_name,
            price: item.price,
            quantity: item.quantity,
            total_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub status: OrderStatus,
    #[serde(serialize_with = "serialize_money")]
    #[schema(value_type = String, example = "550.50")]
    pub total_amount: Decimal,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    pub fn from_parts(order: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: order.id,
            status: order.status,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address,
            phone_number: order.phone_number,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Read side of the order aggregate; callers only ever see their own orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Orders placed by `user_id`, newest first
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderView>, ServiceError> {
        let repo = OrderRepository::new(&*self.db_pool);
        let orders = repo.list_for_user(user_id).await.map_err(|e| {
            error!(error = %e, %user_id, "Failed to list orders");
            ServiceError::DatabaseError(e)
        })?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items = repo.items_by_order(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = items.remove(&order.id).unwrap_or_default();
                OrderView::from_parts(order, lines)
            })
            .collect())
    }

    /// A single order; other users' orders are reported as not found
    #[instrument(skip(self))]
    pub async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let repo = OrderRepository::new(&*self.db_pool);
        let order = repo
            .find_owned(order_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let items = repo.items(order.id).await?;
        Ok(OrderView::from_parts(order, items))
    }
}
