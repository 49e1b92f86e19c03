//! Outbound mail: message composition plus the transport seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    common::format_money,
    entities::{order, user},
};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Recipient missing: {0}")]
    MissingRecipient(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), NotificationError>;
}

/// Writes messages to the operational log instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), NotificationError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Mail dispatched (log transport)"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }

    /// Composes and sends the confirmation for an order that just entered `confirmed`
    #[instrument(skip(self, order, user), fields(order_id = %order.id))]
    pub async fn order_confirmation(
        &self,
        order: &order::Model,
        user: &user::Model,
    ) -> Result<(), NotificationError> {
        let message = self.compose_order_confirmation(order, user)?;
        self.mailer.send(message).await
    }

    pub fn compose_order_confirmation(
        &self,
        order: &order::Model,
        user: &user::Model,
    ) -> Result<MailMessage, NotificationError> {
        if user.email.trim().is_empty() {
            return Err(NotificationError::MissingRecipient(user.username.clone()));
        }

        let address = order
            .shipping_address
            .as_deref()
            .unwrap_or("the address on your profile");
        let body = format!(
            "Hello {},\n\nYour order #{} has been confirmed.\nTotal amount: {}\nShipping address: {}\n\nThank you for shopping with us!",
            user.username,
            order.id,
            format_money(order.total_amount),
            address
        );

        Ok(MailMessage {
            from: self.from.clone(),
            to: user.email.clone(),
            subject: format!("Your order #{} is confirmed!", order.id),
            body,
        })
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn registration_confirmation(
        &self,
        user: &user::Model,
    ) -> Result<(), NotificationError> {
        if user.email.trim().is_empty() {
            warn!("Skipping registration mail: user has no email");
            return Err(NotificationError::MissingRecipient(user.username.clone()));
        }
        let message = MailMessage {
            from: self.from.clone(),
            to: user.email.clone(),
            subject: "Registration confirmed".to_string(),
            body: format!(
                "Hello {},\n\nYour account has been created. You can now sign in and place orders.",
                user.username
            ),
        };
        self.mailer.send(message).await
    }
}
