pub mod auth;
pub mod cart;
pub mod catalog;
pub mod common;
pub mod customers;
pub mod health;
pub mod orders;

use crate::{
    auth::AuthService,
    db::DbPool,
    events::EventSender,
    notifications::NotificationService,
    services::{
        accounts, cart as cart_svc, catalog as catalog_svc, checkout,
        customers as customers_svc, order_status, orders as orders_svc,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<catalog_svc::CatalogService>,
    pub cart: Arc<cart_svc::CartService>,
    pub checkout: Arc<checkout::CheckoutService>,
    pub orders: Arc<orders_svc::OrderService>,
    pub order_status: Arc<order_status::OrderStatusService>,
    pub customers: Arc<customers_svc::CustomerService>,
    pub accounts: Arc<accounts::AccountService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
        notifications: NotificationService,
    ) -> Self {
        let catalog = Arc::new(catalog_svc::CatalogService::new(db_pool.clone()));
        let cart = Arc::new(cart_svc::CartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let checkout = Arc::new(checkout::CheckoutService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(orders_svc::OrderService::new(db_pool.clone()));
        let order_status = Arc::new(order_status::OrderStatusService::new(
            db_pool.clone(),
            event_sender.clone(),
            notifications.clone(),
        ));
        let customers = Arc::new(customers_svc::CustomerService::new(db_pool.clone()));
        let accounts = Arc::new(accounts::AccountService::new(
            db_pool,
            auth_service,
            notifications,
            event_sender,
        ));

        Self {
            catalog,
            cart,
            checkout,
            orders,
            order_status,
            customers,
            accounts,
        }
    }
}
