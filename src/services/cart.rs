use crate::{
    common::serialize_money,
    db::DbPool,
    entities::{cart_item, product},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::CartRepository,
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartProductView {
    pub id: Uuid,
    pub name: String,
    #[serde(serialize_with = "serialize_money")]
    #[schema(value_type = String, example = "150.50")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLineView {
    pub id: Uuid,
    pub product: CartProductView,
    pub quantity: i32,
    #[serde(serialize_with = "serialize_money")]
    #[schema(value_type = String, example = "301.00")]
    pub total_price: Decimal,
}

impl CartLineView {
    fn new(item: &cart_item::Model, product: &product::Model) -> Self {
        Self {
            id: item.id,
            product: CartProductView {
                id: product.id,
                name: product.name.clone(),
                price: product.price,
            },
            quantity: item.quantity,
            total_price: product.price * Decimal::from(item.quantity),
        }
    }
}

/// Cart as displayed; `id` is `null` when the user has no cart yet
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub id: Option<Uuid>,
    pub items: Vec<CartLineView>,
    #[serde(serialize_with = "serialize_money")]
    #[schema(value_type = String, example = "0.00")]
    pub total_price: Decimal,
}

impl CartView {
    pub fn empty() -> Self {
        Self {
            id: None,
            items: Vec::new(),
            total_price: Decimal::ZERO,
        }
    }
}

/// Σ quantity × unit price, always from live prices
pub fn compute_total<'a, I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (i32, &'a Decimal)>,
{
    lines
        .into_iter()
        .map(|(quantity, price)| *price * Decimal::from(quantity))
        .sum()
}

/// Cart Aggregate: one mutable basket per user
#[derive(Clone)]
pub struct CartService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Adds `quantity` of a product to the caller's cart, creating the cart
    /// and the line on demand. An existing line is incremented, never overwritten.
    #[instrument(skip(self))]
    pub async fn add_or_increment(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLineView, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let product = product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Product {} does not exist", product_id))
            })?;

        let repo = CartRepository::new(&txn);
        let cart = repo.get_or_create(user_id).await?;

        let item = match repo.find_item(cart.id, product_id).await? {
            Some(existing) => {
                let combined = existing.quantity.checked_add(quantity).ok_or_else(|| {
                    ServiceError::ValidationError("Quantity is too large".to_string())
                })?;
                repo.set_item_quantity(existing, combined).await?
            }
            None => repo.insert_item(cart.id, product_id, quantity).await?,
        };
        let cart = repo.touch(cart).await?;

        txn.commit().await?;

        counter!("ordering.cart.items_added", 1);
        info!(cart_id = %cart.id, %product_id, quantity = item.quantity, "Cart line updated");
        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                product_id,
                quantity,
            })
            .await;

        Ok(CartLineView::new(&item, &product))
    }

    /// Overwrites a line's quantity. Zero or less deletes the line and yields `None`.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLineView>, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let repo = CartRepository::new(&txn);

        let (item, cart) = repo
            .find_item_owned(item_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        if quantity <= 0 {
            repo.delete_item(item).await?;
            repo.touch(cart.clone()).await?;
            txn.commit().await?;
            self.event_sender
                .send_or_log(Event::CartItemRemoved {
                    cart_id: cart.id,
                    cart_item_id: item_id,
                })
                .await;
            return Ok(None);
        }

        let product = product::Entity::find_by_id(item.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::InvalidCartItem {
                item_id,
                product_id: item.product_id,
            })?;
        let updated = repo.set_item_quantity(item, quantity).await?;
        repo.touch(cart).await?;
        txn.commit().await?;

        Ok(Some(CartLineView::new(&updated, &product)))
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let repo = CartRepository::new(&txn);
        let (item, cart) = repo
            .find_item_owned(item_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;
        repo.delete_item(item).await?;
        repo.touch(cart.clone()).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id: cart.id,
                cart_item_id: item_id,
            })
            .await;
        Ok(())
    }

    /// The caller's cart priced at current catalog prices
    #[instrument(skip(self))]
    pub async fn view(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let repo = CartRepository::new(&*self.db_pool);
        let Some(cart) = repo.find_by_user(user_id).await? else {
            return Ok(CartView::empty());
        };

        let mut items = Vec::new();
        for (item, product) in repo.items_with_products(cart.id).await? {
            match product {
                Some(product) => items.push(CartLineView::new(&item, &product)),
                None => warn!(
                    cart_item_id = %item.id,
                    product_id = %item.product_id,
                    "Cart line references a product that no longer exists"
                ),
            }
        }
        let total_price = compute_total(items.iter().map(|l| (l.quantity, &l.product.price)));

        Ok(CartView {
            id: Some(cart.id),
            items,
            total_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_of_nothing_is_zero() {
        assert_eq!(compute_total(std::iter::empty()), Decimal::ZERO);
    }

    #[test]
    fn total_multiplies_and_sums() {
        let a = dec!(150.50);
        let b = dec!(200.00);
        assert_eq!(compute_total(vec![(1, &a), (2, &b)]), dec!(550.50));
    }

    #[test]
    fn empty_view_serializes_with_null_id() {
        let json = serde_json::to_value(CartView::empty()).unwrap();
        assert_eq!(json["id"], serde_json::Value::Null);
        assert_eq!(json["items"], serde_json::json!([]));
        assert_eq!(json["total_price"], "0.00");
    }

    proptest! {
        #[test]
        fn total_matches_cent_arithmetic(
            lines in prop::collection::vec((1i32..50, 0i64..1_000_000), 0..12)
        ) {
            let prices: Vec<Decimal> = lines.iter().map(|(_, cents)| Decimal::new(*cents, 2)).collect();
            let total = compute_total(lines.iter().zip(prices.iter()).map(|((q, _), p)| (*q, p)));
            let expected_cents: i64 = lines.iter().map(|(q, cents)| i64::from(*q) * cents).sum();
            prop_assert_eq!(total, Decimal::new(expected_cents, 2));
        }
    }
}
