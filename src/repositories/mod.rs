//! Per-aggregate persistence.
//!
//! Repositories borrow any [`ConnectionTrait`] implementor, so the same code
//! runs against the pool for single statements and against an open
//! `DatabaseTransaction` when several writes must commit together.

use sea_orm::ConnectionTrait;

pub mod cart_repository;
pub mod order_repository;

pub use cart_repository::CartRepository;
pub use order_repository::OrderRepository;

/// Access to the connection a repository was built on
pub trait Repository<C: ConnectionTrait> {
    fn conn(&self) -> &C;
}
