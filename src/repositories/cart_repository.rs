use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{cart, cart_item, product};
use crate::repositories::Repository;

/// Repository for the cart aggregate (cart plus its lines)
#[derive(Debug)]
pub struct CartRepository<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> Repository<C> for CartRepository<'a, C> {
    fn conn(&self) -> &C {
        self.conn
    }
}

impl<'a, C: ConnectionTrait> CartRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<cart::Model>, DbErr> {
        cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(self.conn())
            .await
    }

    /// Cart by id, only when it belongs to `user_id`
    pub async fn find_owned(
        &self,
        cart_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<cart::Model>, DbErr> {
        cart::Entity::find_by_id(cart_id)
            .filter(cart::Column::UserId.eq(user_id))
            .one(self.conn())
            .await
    }

    pub async fn get_or_create(&self, user_id: Uuid) -> Result<cart::Model, DbErr> {
        if let Some(existing) = self.find_by_user(user_id).await? {
            return Ok(existing);
        }
        let now = Utc::now();
        cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn())
        .await
    }

    pub async fn touch(&self, cart: cart::Model) -> Result<cart::Model, DbErr> {
        let mut active: cart::ActiveModel = cart.into();
        active.updated_at = Set(Utc::now());
        active.update(self.conn()).await
    }

    pub async fn find_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<cart_item::Model>, DbErr> {
        cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(self.conn())
            .await
    }

    /// Line by id together with its cart, only when the cart belongs to `user_id`
    pub async fn find_item_owned(
        &self,
        item_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<(cart_item::Model, cart::Model)>, DbErr> {
        let found = cart_item::Entity::find_by_id(item_id)
            .find_also_related(cart::Entity)
            .one(self.conn())
            .await?;
        Ok(match found {
            Some((item, Some(cart))) if cart.user_id == user_id => Some((item, cart)),
            _ => None,
        })
    }

    /// Lines in insertion order, joined with their live product; `None` when the product is gone
    pub async fn items_with_products(
        &self,
        cart_id: Uuid,
    ) -> Result<Vec<(cart_item::Model, Option<product::Model>)>, DbErr> {
        cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .order_by_asc(cart_item::Column::Id)
            .find_also_related(product::Entity)
            .all(self.conn())
            .await
    }

    pub async fn insert_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<cart_item::Model, DbErr> {
        let now = Utc::now();
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn())
        .await
    }

    pub async fn set_item_quantity(
        &self,
        item: cart_item::Model,
        quantity: i32,
    ) -> Result<cart_item::Model, DbErr> {
        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now());
        active.update(self.conn()).await
    }

    pub async fn delete_item(&self, item: cart_item::Model) -> Result<(), DbErr> {
        item.delete(self.conn()).await.map(|_| ())
    }

    /// Removes every line of the cart, then the cart row.
    ///
    /// Returns `false` when the cart row was already gone, e.g. consumed by a
    /// concurrent checkout that committed first.
    pub async fn delete_with_items(&self, cart: cart::Model) -> Result<bool, DbErr> {
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(self.conn())
            .await?;
        let removed = cart.delete(self.conn()).await?.rows_affected;
        Ok(removed > 0)
    }
}
