use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{
    order::{self, OrderStatus},
    order_item,
};
use crate::repositories::Repository;

/// Fields of a new order row
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
}

/// Snapshot values copied onto an order line
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub supplier_name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub position: i32,
}

/// Repository for the order aggregate (order plus its snapshot lines)
#[derive(Debug)]
pub struct OrderRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> Repository<C> for OrderRepository<'a, C> {
    fn conn(&self) -> &C {
        self.conn
    }
}

impl<'a, C: ConnectionTrait> OrderRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts a `new` order with a zero placeholder total
    pub async fn insert(&self, new: NewOrder) -> Result<order::Model, DbErr> {
        let now = Utc::now();
        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(Some(new.user_id)),
            customer_id: Set(new.customer_id),
            status: Set(OrderStatus::New),
            total_amount: Set(Decimal::ZERO),
            shipping_address: Set(new.shipping_address),
            phone_number: Set(new.phone_number),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn())
        .await
    }

    pub async fn insert_item(
        &self,
        order_id: Uuid,
        line: NewOrderItem,
    ) -> Result<order_item::Model, DbErr> {
        order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(Some(line.product_id)),
            product_name: Set(line.product_name),
            supplier_name: Set(line.supplier_name),
            price: Set(line.price),
            quantity: Set(line.quantity),
            position: Set(line.position),
        }
        .insert(self.conn())
        .await
    }

    pub async fn set_total(
        &self,
        order: order::Model,
        total: Decimal,
    ) -> Result<order::Model, DbErr> {
        let mut active: order::ActiveModel = order.into();
        active.total_amount = Set(total);
        active.updated_at = Set(Utc::now());
        active.update(self.conn()).await
    }

    pub async fn set_status(
        &self,
        order: order::Model,
        status: OrderStatus,
    ) -> Result<order::Model, DbErr> {
        let mut active: order::ActiveModel = order.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(self.conn()).await
    }

    pub async fn find_by_id(&self, order_id: Uuid) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find_by_id(order_id).one(self.conn()).await
    }

    /// Order by id, only when it belongs to `user_id`
    pub async fn find_owned(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(self.conn())
            .await
    }

    /// Newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<order::Model>, DbErr> {
        order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(self.conn())
            .await
    }

    /// Lines in the order they were placed
    pub async fn items(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, DbErr> {
        order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Position)
            .order_by_asc(order_item::Column::Id)
            .all(self.conn())
            .await
    }

    /// Lines for several orders at once, grouped by order id
    pub async fn items_by_order(
        &self,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<order_item::Model>>, DbErr> {
        let mut grouped: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }
        let rows = order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids.iter().copied()))
            .order_by_asc(order_item::Column::Position)
            .order_by_asc(order_item::Column::Id)
            .all(self.conn())
            .await?;
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row);
        }
        Ok(grouped)
    }
}
