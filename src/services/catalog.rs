use crate::{
    common::{non_blank, serialize_money},
    db::DbPool,
    entities::{category, product, product_attribute, product_attribute_value, supplier},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Characteristic {
    pub attribute_name: String,
    pub value: String,
}

/// Product as exposed by the catalog API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Supplier name, `null` when the supplier was removed
    pub supplier: Option<String>,
    pub category: Option<String>,
    pub characteristics: Vec<Characteristic>,
    #[serde(serialize_with = "serialize_money")]
    #[schema(value_type = String, example = "150.50")]
    pub price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub external_id: Option<i64>,
}

impl From<category::Model> for CategoryView {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            external_id: m.external_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SupplierView {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<supplier::Model> for SupplierView {
    fn from(m: supplier::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            contact_person: m.contact_person,
            phone: m.phone,
            email: m.email,
            address: m.address,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 255, message = "Supplier name is required"))]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "150.50")]
    pub price: Decimal,
    pub supplier_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
}

/// Catalog Store: read-mostly product, category and supplier data
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductView>, ServiceError> {
        let db = &*self.db_pool;
        let products = product::Entity::find()
            .order_by_asc(product::Column::Name)
            .all(db)
            .await?;
        let mut views = Vec::with_capacity(products.len());
        for p in products {
            views.push(self.product_view(db, p).await?);
        }
        Ok(views)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductView, ServiceError> {
        let db = &*self.db_pool;
        let found = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        self.product_view(db, found).await
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryView>, ServiceError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(rows.into_iter().map(CategoryView::from).collect())
    }

    pub async fn list_suppliers(&self) -> Result<Vec<SupplierView>, ServiceError> {
        let rows = supplier::Entity::find()
            .order_by_asc(supplier::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(rows.into_iter().map(SupplierView::from).collect())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
    ) -> Result<SupplierView, ServiceError> {
        request.validate()?;
        let created = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            contact_person: Set(non_blank(request.contact_person)),
            phone: Set(non_blank(request.phone)),
            email: Set(non_blank(request.email)),
            address: Set(non_blank(request.address)),
        }
        .insert(&*self.db_pool)
        .await?;
        info!(supplier_id = %created.id, "Supplier created");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: &str,
        external_id: Option<i64>,
    ) -> Result<CategoryView, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name is required".to_string(),
            ));
        }
        let created = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            external_id: Set(external_id),
        }
        .insert(&*self.db_pool)
        .await?;
        Ok(created.into())
    }

    /// Creates a product and its characteristics; unknown attribute names are created on the fly
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductView, ServiceError> {
        request.validate()?;
        validate_price(request.price)?;

        let txn = self.db_pool.begin().await?;

        if let Some(supplier_id) = request.supplier_id {
            supplier::Entity::find_by_id(supplier_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("Supplier {} does not exist", supplier_id))
                })?;
        }
        if let Some(category_id) = request.category_id {
            category::Entity::find_by_id(category_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("Category {} does not exist", category_id))
                })?;
        }

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(non_blank(request.description)),
            price: Set(request.price),
            supplier_id: Set(request.supplier_id),
            category_id: Set(request.category_id),
            stock_quantity: Set(request.stock_quantity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for characteristic in request.characteristics {
            let attribute = attribute_by_name(&txn, &characteristic.attribute_name).await?;
            product_attribute_value::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(created.id),
                attribute_id: Set(attribute.id),
                value: Set(characteristic.value),
            }
            .insert(&txn)
            .await?;
        }

        let view = self.product_view(&txn, created).await?;
        txn.commit().await?;
        info!(product_id = %view.id, "Product created");
        Ok(view)
    }

    /// Changes the live price; placed orders keep their snapshot
    #[instrument(skip(self))]
    pub async fn update_product_price(
        &self,
        product_id: Uuid,
        price: Decimal,
    ) -> Result<ProductView, ServiceError> {
        validate_price(price)?;
        let db = &*self.db_pool;
        let found = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut active: product::ActiveModel = found.into();
        active.price = Set(price);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;
        self.product_view(db, updated).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let found = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        found.delete(db).await?;
        info!(%product_id, "Product deleted");
        Ok(())
    }

    async fn product_view<C: ConnectionTrait>(
        &self,
        conn: &C,
        p: product::Model,
    ) -> Result<ProductView, ServiceError> {
        let supplier_name = match p.supplier_id {
            Some(id) => supplier::Entity::find_by_id(id)
                .one(conn)
                .await?
                .map(|s| s.name),
            None => None,
        };
        let category_name = match p.category_id {
            Some(id) => category::Entity::find_by_id(id)
                .one(conn)
                .await?
                .map(|c| c.name),
            None => None,
        };

        let values = product_attribute_value::Entity::find()
            .filter(product_attribute_value::Column::ProductId.eq(p.id))
            .find_also_related(product_attribute::Entity)
            .all(conn)
            .await?;
        let mut characteristics: Vec<Characteristic> = values
            .into_iter()
            .filter_map(|(value, attribute)| {
                attribute.map(|a| Characteristic {
                    attribute_name: a.name,
                    value: value.value,
                })
            })
            .collect();
        characteristics.sort_by(|a, b| a.attribute_name.cmp(&b.attribute_name));

        Ok(ProductView {
            id: p.id,
            name: p.name,
            description: p.description,
            supplier: supplier_name,
            category: category_name,
            characteristics,
            price: p.price,
            stock_quantity: p.stock_quantity,
        })
    }
}

fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }
    if price.scale() > 2 && price != price.round_dp(2) {
        return Err(ServiceError::ValidationError(
            "Price supports at most two decimal places".to_string(),
        ));
    }
    Ok(())
}

async fn attribute_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<product_attribute::Model, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationError(
            "Attribute name is required".to_string(),
        ));
    }
    if let Some(existing) = product_attribute::Entity::find()
        .filter(product_attribute::Column::Name.eq(name))
        .one(conn)
        .await?
    {
        return Ok(existing);
    }
    Ok(product_attribute::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    }
    .insert(conn)
    .await?)
}

/// Supplier names keyed by id, for callers that resolve many products at once
pub async fn supplier_names<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, String>, ServiceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = supplier::Entity::find()
        .filter(supplier::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|s| (s.id, s.name)).collect())
}
