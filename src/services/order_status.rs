use std::str::FromStr;
use std::sync::Arc;

use metrics::counter;
use sea_orm::{EntityTrait, TransactionTrait};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{order, user, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::NotificationService,
    repositories::OrderRepository,
    services::orders::OrderView,
};

/// Parses a requested status name
pub fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw.trim().to_ascii_lowercase().as_str()).map_err(|_| {
        let valid: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        ServiceError::InvalidStatus(format!(
            "'{}' is not a valid status; expected one of: {}",
            raw,
            valid.join(", ")
        ))
    })
}

/// Status Transition Gate: privileged, adjacency-checked status changes
#[derive(Clone)]
pub struct OrderStatusService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    notifications: NotificationService,
}

impl OrderStatusService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            notifications,
        }
    }

    /// Moves an order to `new_status`.
    ///
    /// Entering `confirmed` sends the order confirmation mail after the
    /// change has committed; a mail failure is logged and never undoes it.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn transition(
        &self,
        order_id: Uuid,
        new_status: &str,
        actor: &AuthUser,
    ) -> Result<OrderView, ServiceError> {
        actor.require_admin()?;
        let target = parse_status(new_status)?;

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;
        let repo = OrderRepository::new(&txn);

        let current = repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let previous = current.status;

        if !previous.can_transition_to(target) {
            warn!(from = %previous, to = %target, "Rejected status transition");
            return Err(ServiceError::InvalidTransition {
                from: previous.to_string(),
                to: target.to_string(),
            });
        }

        let updated = repo.set_status(current, target).await?;
        let items = repo.items(updated.id).await?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit transaction for order {}: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        counter!("ordering.orders.status_changed", 1, "to" => target.as_str());
        info!(
            "Order {} status updated from '{}' to '{}'",
            order_id, previous, target
        );
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: previous.to_string(),
                new_status: target.to_string(),
            })
            .await;

        if target == OrderStatus::Confirmed {
            self.notify_confirmed(&updated).await;
        }

        Ok(OrderView::from_parts(updated, items))
    }

    async fn notify_confirmed(&self, order: &order::Model) {
        let Some(user_id) = order.user_id else {
            warn!(order_id = %order.id, "Confirmed order has no user; skipping notification");
            return;
        };

        let recipient = match user::Entity::find_by_id(user_id).one(&*self.db_pool).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                warn!(order_id = %order.id, %user_id, "Order owner no longer exists; skipping notification");
                return;
            }
            Err(e) => {
                counter!("ordering.notifications.failed", 1);
                error!(order_id = %order.id, error = %e, "Could not load order owner for notification");
                return;
            }
        };

        if let Err(e) = self
            .notifications
            .order_confirmation(order, &recipient)
            .await
        {
            counter!("ordering.notifications.failed", 1);
            error!(order_id = %order.id, error = %e, "Order confirmation notification failed");
        }
    }
}
