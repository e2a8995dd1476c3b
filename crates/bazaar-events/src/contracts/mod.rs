//! Event contracts published by Bazaar services.

pub mod customer;
pub mod product;

pub use customer::{CUSTOMERS_TOPIC, CustomerCreated, CustomerDeleted, CustomerUpdated};
pub use product::{PRODUCTS_TOPIC, ProductCreated, ProductDeleted, ProductUpdated};
