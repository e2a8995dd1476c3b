pub mod customer;
pub mod events;
