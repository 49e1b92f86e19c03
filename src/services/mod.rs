// Catalog Store
pub mod catalog;

// Cart and order aggregates
pub mod cart;
pub mod checkout;
pub mod order_status;
pub mod orders;

// Customer management
pub mod accounts;
pub mod customers;
