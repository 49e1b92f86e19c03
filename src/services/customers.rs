use crate::{common::non_blank, db::DbPool, entities::customer, errors::ServiceError};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Default shipping/contact data used as checkout fallback
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<customer::Model> for CustomerProfile {
    fn from(m: customer::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            address: m.address,
            phone: m.phone,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpsertProfileRequest {
    #[validate(length(max = 1024))]
    pub address: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<CustomerProfile, ServiceError> {
        customer::Entity::find()
            .filter(customer::Column::UserId.eq(user_id))
            .one(&*self.db_pool)
            .await?
            .map(CustomerProfile::from)
            .ok_or_else(|| ServiceError::NotFound("Customer profile not found".to_string()))
    }

    /// Creates the 1:1 profile row or overwrites it
    #[instrument(skip(self, request))]
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        request: UpsertProfileRequest,
    ) -> Result<CustomerProfile, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let now = Utc::now();
        let address = non_blank(request.address);
        let phone = non_blank(request.phone);

        let existing = customer::Entity::find()
            .filter(customer::Column::UserId.eq(user_id))
            .one(db)
            .await?;

        let saved = match existing {
            Some(found) => {
                let mut active: customer::ActiveModel = found.into();
                active.address = Set(address);
                active.phone = Set(phone);
                active.updated_at = Set(now);
                active.update(db).await?
            }
            None => {
                let created = customer::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    address: Set(address),
                    phone: Set(phone),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(db)
                .await?;
                info!(customer_id = %created.id, "Customer profile created");
                created
            }
        };
        Ok(saved.into())
    }
}
