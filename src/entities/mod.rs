pub mod cart;
pub mod cart_item;
pub mod category;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_attribute;
pub mod product_attribute_value;
pub mod supplier;
pub mod user;

pub use order::OrderStatus;
