//! Checkout: converts a cart into an order inside one transaction.
//!
//! Every failure rolls back all writes made by the call. Either the order,
//! its lines and the cart deletion all commit, or nothing does.

use crate::{
    common::non_blank,
    db::DbPool,
    entities::{customer, order_item::UNKNOWN_SUPPLIER},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{
        order_repository::{NewOrder, NewOrderItem},
        CartRepository, OrderRepository,
    },
    services::{catalog::supplier_names, orders::OrderView},
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    pub cart_id: Uuid,
    /// Falls back to the customer profile address when omitted
    #[validate(length(max = 1024))]
    pub shipping_address: Option<String>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
}

/// Checkout Orchestrator
#[derive(Clone)]
pub struct CheckoutService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Places an order from the caller's cart.
    ///
    /// Re-submitting a cart that was already checked out fails with
    /// `NotFound`, since the cart no longer exists.
    #[instrument(skip(self, request), fields(cart_id = %request.cart_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<OrderView, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        let view = match self.place_order(&txn, user_id, &request).await {
            Ok(view) => view,
            Err(err) => {
                counter!("ordering.checkout.failed", 1, "kind" => err.kind());
                warn!(error = %err, "Checkout rejected");
                if let Err(rollback_err) = txn.rollback().await {
                    error!(error = %rollback_err, "Checkout rollback failed");
                }
                return Err(err);
            }
        };

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %view.id, "Failed to commit checkout");
            counter!("ordering.checkout.failed", 1, "kind" => "database_error");
            ServiceError::DatabaseError(e)
        })?;

        counter!("ordering.checkout.completed", 1);
        info!(
            order_id = %view.id,
            items = view.items.len(),
            total = %view.total_amount,
            "Order placed"
        );
        self.event_sender
            .send_or_log(Event::OrderCreated(view.id))
            .await;

        Ok(view)
    }

    async fn place_order(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        request: &CheckoutRequest,
    ) -> Result<OrderView, ServiceError> {
        let carts = CartRepository::new(txn);
        let orders = OrderRepository::new(txn);

        let cart = carts
            .find_owned(request.cart_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", request.cart_id)))?;

        let profile = customer::Entity::find()
            .filter(customer::Column::UserId.eq(user_id))
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::PreconditionFailed(
                    "customer profile missing; complete your profile before checkout".to_string(),
                )
            })?;

        let order = orders
            .insert(NewOrder {
                user_id,
                customer_id: Some(profile.id),
                shipping_address: non_blank(request.shipping_address.clone())
                    .or_else(|| profile.address.clone()),
                phone_number: non_blank(request.phone_number.clone())
                    .or_else(|| profile.phone.clone()),
            })
            .await?;

        let lines = carts.items_with_products(cart.id).await?;
        if lines.is_empty() {
            return Err(ServiceError::EmptyCart(cart.id));
        }

        let supplier_ids: Vec<Uuid> = lines
            .iter()
            .filter_map(|(_, product)| product.as_ref().and_then(|p| p.supplier_id))
            .collect();
        let suppliers = supplier_names(txn, &supplier_ids).await?;

        let mut total = Decimal::ZERO;
        let mut items = Vec::with_capacity(lines.len());
        for (position, (line, product)) in (0_i32..).zip(lines) {
            let product = product.ok_or(ServiceError::InvalidCartItem {
                item_id: line.id,
                product_id: line.product_id,
            })?;
            let supplier_name = product
                .supplier_id
                .and_then(|id| suppliers.get(&id).cloned())
                .unwrap_or_else(|| UNKNOWN_SUPPLIER.to_string());

            let item = orders
                .insert_item(
                    order.id,
                    NewOrderItem {
                        product_id: product.id,
                        product_name: product.name,
                        supplier_name,
                        price: product.price,
                        quantity: line.quantity,
                        position,
                    },
                )
                .await?;
            total += item.line_total();
            items.push(item);
        }

        let order = orders.set_total(order, total).await?;
        let cart_id = cart.id;
        if !carts.delete_with_items(cart).await? {
            return Err(ServiceError::NotFound(format!("Cart {cart_id} not found")));
        }

        Ok(OrderView::from_parts(order, items))
    }
}
